//! Entity types published into a manifest.
//!
//! One concrete struct per kind. They share only [`Config`] and the id
//! scheme. Entities are built by the parser with default configs and
//! finalized by the manifest builder.

use std::borrow::Borrow;
use std::fmt;

use semantic_config::Config;
use serde::{Deserialize, Serialize};

/// Kinds of top-level entities, in manifest ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    SemanticModel,
    Metric,
    Group,
}

impl EntityKind {
    /// Prefix used in unique ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            EntityKind::SemanticModel => "semantic_model",
            EntityKind::Metric => "metric",
            EntityKind::Group => "group",
        }
    }

    /// Whether `enabled: false` moves entities of this kind to the disabled bucket
    pub fn is_gated(&self) -> bool {
        !matches!(self, EntityKind::Group)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::SemanticModel => "semantic model",
            EntityKind::Metric => "metric",
            EntityKind::Group => "group",
        };
        f.write_str(name)
    }
}

/// Stable identifier: `<kind>.<package>.<name>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    pub fn new(kind: EntityKind, package: &str, name: &str) -> Self {
        Self(format!("{}.{}.{}", kind.id_prefix(), package, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for UniqueId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Dimension type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    Categorical,
    Time,
}

/// Entity (key) type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Primary,
    Unique,
    Foreign,
    Natural,
}

/// Measure aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Min,
    Max,
    Count,
    CountDistinct,
    SumBoolean,
    Average,
    Percentile,
    Median,
}

/// Metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Simple,
    Ratio,
    Cumulative,
    Derived,
    Conversion,
}

/// Categorical or time dimension of a semantic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,

    #[serde(rename = "type")]
    pub dimension_type: DimensionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Only for time dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_granularity: Option<String>,

    pub config: Config,
}

/// Quantitative sub-component, referenceable by metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,

    pub agg: Aggregation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_time_dimension: Option<String>,

    pub config: Config,
}

/// Key sub-component of a semantic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    pub config: Config,
}

/// Named collection of dimensions, measures and entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticModel {
    pub name: String,
    pub package: String,

    /// Project-relative path of the declaring document
    pub original_file_path: String,

    /// Underlying model reference, passed through to the templating layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agg_time_dimension: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_entity: Option<String>,

    #[serde(default)]
    pub dimensions: Vec<Dimension>,

    #[serde(default)]
    pub measures: Vec<Measure>,

    #[serde(default)]
    pub entities: Vec<Entity>,

    pub config: Config,
}

impl SemanticModel {
    pub fn unique_id(&self) -> UniqueId {
        UniqueId::new(EntityKind::SemanticModel, &self.package, &self.name)
    }

    /// Resolved group, from config
    pub fn group(&self) -> Option<&str> {
        self.config.group.as_deref()
    }

    pub fn get_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn get_measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn has_measure(&self, name: &str) -> bool {
        self.get_measure(name).is_some()
    }
}

/// Named computation over one or more measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub package: String,
    pub original_file_path: String,

    #[serde(rename = "type")]
    pub metric_type: MetricType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Referenced measure names in declaration order, resolved lazily
    #[serde(default)]
    pub measures: Vec<String>,

    /// Referenced metric names (ratio and derived metrics)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_metrics: Vec<String>,

    pub config: Config,
}

impl Metric {
    pub fn unique_id(&self) -> UniqueId {
        UniqueId::new(EntityKind::Metric, &self.package, &self.name)
    }

    pub fn group(&self) -> Option<&str> {
        self.config.group.as_deref()
    }
}

/// Owner of a group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Named classification container, never gated by `enabled`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub package: String,
    pub original_file_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub config: Config,
}

impl Group {
    pub fn unique_id(&self) -> UniqueId {
        UniqueId::new(EntityKind::Group, &self.package, &self.name)
    }
}

/// A gated manifest entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum Node {
    SemanticModel(SemanticModel),
    Metric(Metric),
}

impl Node {
    pub fn kind(&self) -> EntityKind {
        match self {
            Node::SemanticModel(_) => EntityKind::SemanticModel,
            Node::Metric(_) => EntityKind::Metric,
        }
    }

    pub fn unique_id(&self) -> UniqueId {
        match self {
            Node::SemanticModel(model) => model.unique_id(),
            Node::Metric(metric) => metric.unique_id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::SemanticModel(model) => &model.name,
            Node::Metric(metric) => &metric.name,
        }
    }

    pub fn config(&self) -> &Config {
        match self {
            Node::SemanticModel(model) => &model.config,
            Node::Metric(metric) => &metric.config,
        }
    }

    pub fn original_file_path(&self) -> &str {
        match self {
            Node::SemanticModel(model) => &model.original_file_path,
            Node::Metric(metric) => &metric.original_file_path,
        }
    }

    pub fn as_semantic_model(&self) -> Option<&SemanticModel> {
        match self {
            Node::SemanticModel(model) => Some(model),
            Node::Metric(_) => None,
        }
    }

    pub fn as_metric(&self) -> Option<&Metric> {
        match self {
            Node::Metric(metric) => Some(metric),
            Node::SemanticModel(_) => None,
        }
    }
}
