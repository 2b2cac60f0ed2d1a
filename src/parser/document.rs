//! YAML document schema.
//!
//! These types mirror what users write. Config-bearing properties stay as
//! raw JSON values until the parser turns them into typed fragments.

use serde::Deserialize;
use serde_json::Value;

use crate::manifest::{Aggregation, DimensionType, EntityType, MetricType, Owner};

/// Top-level keys of an entity document. Other keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub semantic_models: Vec<SemanticModelBlock>,

    #[serde(default)]
    pub metrics: Vec<MetricBlock>,

    #[serde(default)]
    pub groups: Vec<GroupBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticModelBlock {
    pub name: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub defaults: Option<ModelDefaults>,

    #[serde(default)]
    pub primary_entity: Option<String>,

    #[serde(default)]
    pub dimensions: Vec<DimensionBlock>,

    #[serde(default)]
    pub measures: Vec<MeasureBlock>,

    #[serde(default)]
    pub entities: Vec<EntityBlock>,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefaults {
    #[serde(default)]
    pub agg_time_dimension: Option<String>,
}

/// Config-bearing properties written directly on a block.
///
/// `group` and `meta` are shortcuts; `config:` wins over them.
#[derive(Debug, Default, Clone)]
pub struct InlineConfig {
    pub group: Option<Value>,
    pub meta: Option<Value>,
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionBlock {
    pub name: String,

    #[serde(rename = "type")]
    pub dimension_type: DimensionType,

    #[serde(default)]
    pub expr: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub type_params: Option<DimensionTypeParams>,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionTypeParams {
    #[serde(default)]
    pub time_granularity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureBlock {
    pub name: String,

    pub agg: Aggregation,

    #[serde(default)]
    pub expr: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub agg_time_dimension: Option<String>,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityBlock {
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    #[serde(default)]
    pub expr: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricBlock {
    pub name: String,

    #[serde(rename = "type")]
    pub metric_type: MetricType,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub filter: Option<Value>,

    #[serde(default)]
    pub type_params: MetricTypeParams,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

/// A measure or metric input, written as a bare name or `{name: ...}`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputRef {
    Name(String),
    Detailed { name: String },
}

impl InputRef {
    pub fn name(&self) -> &str {
        match self {
            InputRef::Name(name) => name,
            InputRef::Detailed { name } => name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricTypeParams {
    #[serde(default)]
    pub measure: Option<InputRef>,

    #[serde(default)]
    pub measures: Vec<InputRef>,

    #[serde(default)]
    pub numerator: Option<InputRef>,

    #[serde(default)]
    pub denominator: Option<InputRef>,

    #[serde(default)]
    pub metrics: Vec<InputRef>,

    #[serde(default)]
    pub expr: Option<String>,

    #[serde(default)]
    pub conversion_type_params: Option<ConversionTypeParams>,

    /// Cumulative window, e.g. `7 days`. Not carried into the manifest.
    #[serde(default)]
    pub window: Option<Value>,

    #[serde(default)]
    pub grain_to_date: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionTypeParams {
    #[serde(default)]
    pub base_measure: Option<InputRef>,

    #[serde(default)]
    pub conversion_measure: Option<InputRef>,

    #[serde(default)]
    pub entity: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupBlock {
    pub name: String,

    #[serde(default)]
    pub owner: Option<Owner>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub group: Option<Value>,

    #[serde(default)]
    pub meta: Option<Value>,

    #[serde(default)]
    pub config: Option<Value>,
}

macro_rules! inline_config {
    ($($block:ty),+ $(,)?) => {
        $(
            impl $block {
                /// The block's `group`, `meta` and `config:` properties
                pub fn inline(&self) -> InlineConfig {
                    InlineConfig {
                        group: self.group.clone(),
                        meta: self.meta.clone(),
                        config: self.config.clone(),
                    }
                }
            }
        )+
    };
}

inline_config!(
    SemanticModelBlock,
    DimensionBlock,
    MeasureBlock,
    EntityBlock,
    MetricBlock,
    GroupBlock,
);

/// Render a scalar expression (`expr: 1`, `expr: amount`) as text.
pub fn expr_text(expr: Option<Value>) -> Option<String> {
    match expr? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
