//! Entity parser (verb module)
//!
//! Turns YAML documents into unresolved records. Each record carries its
//! structural content plus the stack of raw config layers that apply to it:
//! project global, project path scopes, inline. Sub-components carry their
//! own component layers. Nothing is resolved here.
//!
//! Parsing is all-or-nothing: any malformed document fails the whole set.

mod discover;
mod document;
mod layers;

pub use discover::{discover_documents, ExcludeRules, SourceDocument};
pub use document::Document;

use std::collections::HashSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use semantic_config::{Config, ConfigError, ConfigFragment, ConfigOrigin};
use tracing::debug;

use crate::error::{Error, ParsingError, Result};
use crate::manifest::{
    Dimension, Entity, EntityKind, Group, Measure, Metric, MetricType, Record, SemanticModel,
    SemanticModelRecord, Unresolved,
};
use crate::project::ProjectConfig;
use document::{
    expr_text, DimensionBlock, EntityBlock, GroupBlock, InputRef, InlineConfig, MeasureBlock,
    MetricBlock, SemanticModelBlock,
};
use layers::record_layers;

const NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

fn is_valid_name(name: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(NAME_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

fn check_name(kind: &'static str, name: &str, path: &str) -> std::result::Result<(), ParsingError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ParsingError::InvalidName {
            kind,
            name: name.to_string(),
            path: path.to_string(),
        })
    }
}

/// Parse a single YAML document into a [`Document`].
///
/// An empty document (or one holding only comments) has no entities.
pub fn parse_str(path: &str, yaml: &str) -> std::result::Result<Document, ParsingError> {
    let invalid = |e: serde_yaml::Error| ParsingError::InvalidDocument {
        path: path.to_string(),
        message: e.to_string(),
    };
    let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(invalid)?;
    if value.is_null() {
        return Ok(Document::default());
    }
    serde_yaml::from_value(value).map_err(invalid)
}

/// Parse every document into records, in document order.
pub fn parse_documents(project: &ProjectConfig, documents: &[SourceDocument]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for document in documents {
        records.extend(parse_document(project, document)?);
    }
    Ok(records)
}

/// Parse one document into records.
pub fn parse_document(project: &ProjectConfig, document: &SourceDocument) -> Result<Vec<Record>> {
    let parsed = parse_str(&document.path, &document.contents)?;
    let ctx = DocumentContext { project, document };

    let mut records = Vec::new();
    for block in parsed.semantic_models {
        records.push(Record::SemanticModel(ctx.semantic_model(block)?));
    }
    for block in parsed.metrics {
        records.push(Record::Metric(ctx.metric(block)?));
    }
    for block in parsed.groups {
        records.push(Record::Group(ctx.group(block)?));
    }

    debug!(path = %document.path, records = records.len(), "parsed document");
    Ok(records)
}

struct DocumentContext<'a> {
    project: &'a ProjectConfig,
    document: &'a SourceDocument,
}

impl DocumentContext<'_> {
    fn path(&self) -> &str {
        &self.document.path
    }

    /// Project layers for an entity: global, package, directories, name.
    fn project_layers(&self, kind: EntityKind, name: &str) -> Vec<ConfigFragment> {
        let scope_path = std::iter::once(self.project.name.as_str())
            .chain(self.document.scope_dirs.iter().map(String::as_str))
            .chain(std::iter::once(name));
        self.project.scope(kind).layers_for(scope_path)
    }

    fn layers(&self, kind: EntityKind, name: &str, inline: &InlineConfig) -> Result<Vec<ConfigFragment>> {
        record_layers(self.project_layers(kind, name), inline)
            .map_err(|source| self.config_error(kind, name, source))
    }

    fn config_error(&self, kind: impl std::fmt::Display, name: &str, source: ConfigError) -> Error {
        Error::config(format!("{} `{}` in `{}`", kind, name, self.path()), source)
    }

    fn component_layers(&self, kind: &'static str, name: &str, inline: &InlineConfig) -> Result<Vec<ConfigFragment>> {
        inline
            .fragments(ConfigOrigin::Component)
            .map_err(|source| self.config_error(kind, name, source))
    }

    fn semantic_model(&self, block: SemanticModelBlock) -> Result<SemanticModelRecord> {
        check_name("semantic model", &block.name, self.path())?;
        let layers = self.layers(EntityKind::SemanticModel, &block.name, &block.inline())?;

        let mut seen = HashSet::new();
        let dimensions = block
            .dimensions
            .into_iter()
            .map(|d| self.dimension(&block.name, d, &mut seen))
            .collect::<Result<Vec<_>>>()?;

        seen.clear();
        let measures = block
            .measures
            .into_iter()
            .map(|m| self.measure(&block.name, m, &mut seen))
            .collect::<Result<Vec<_>>>()?;

        seen.clear();
        let entities = block
            .entities
            .into_iter()
            .map(|e| self.entity(&block.name, e, &mut seen))
            .collect::<Result<Vec<_>>>()?;

        let model = SemanticModel {
            name: block.name,
            package: self.project.name.clone(),
            original_file_path: self.path().to_string(),
            model: block.model,
            description: block.description,
            label: block.label,
            agg_time_dimension: block.defaults.and_then(|d| d.agg_time_dimension),
            primary_entity: block.primary_entity,
            dimensions: Vec::new(),
            measures: Vec::new(),
            entities: Vec::new(),
            config: Config::default(),
        };

        Ok(SemanticModelRecord {
            model: Unresolved::new(model, layers),
            dimensions,
            measures,
            entities,
        })
    }

    fn check_component(
        &self,
        model: &str,
        component: &'static str,
        name: &str,
        seen: &mut HashSet<String>,
    ) -> std::result::Result<(), ParsingError> {
        check_name(component, name, self.path())?;
        if !seen.insert(name.to_string()) {
            return Err(ParsingError::DuplicateComponent {
                model: model.to_string(),
                component,
                name: name.to_string(),
                path: self.path().to_string(),
            });
        }
        Ok(())
    }

    fn dimension(&self, model: &str, block: DimensionBlock, seen: &mut HashSet<String>) -> Result<Unresolved<Dimension>> {
        self.check_component(model, "dimension", &block.name, seen)?;
        let layers = self.component_layers("dimension", &block.name, &block.inline())?;
        let dimension = Dimension {
            name: block.name,
            dimension_type: block.dimension_type,
            expr: expr_text(block.expr),
            description: block.description,
            label: block.label,
            time_granularity: block.type_params.and_then(|p| p.time_granularity),
            config: Config::default(),
        };
        Ok(Unresolved::new(dimension, layers))
    }

    fn measure(&self, model: &str, block: MeasureBlock, seen: &mut HashSet<String>) -> Result<Unresolved<Measure>> {
        self.check_component(model, "measure", &block.name, seen)?;
        let layers = self.component_layers("measure", &block.name, &block.inline())?;
        let measure = Measure {
            name: block.name,
            agg: block.agg,
            expr: expr_text(block.expr),
            description: block.description,
            label: block.label,
            agg_time_dimension: block.agg_time_dimension,
            config: Config::default(),
        };
        Ok(Unresolved::new(measure, layers))
    }

    fn entity(&self, model: &str, block: EntityBlock, seen: &mut HashSet<String>) -> Result<Unresolved<Entity>> {
        self.check_component(model, "entity", &block.name, seen)?;
        let layers = self.component_layers("entity", &block.name, &block.inline())?;
        let entity = Entity {
            name: block.name,
            entity_type: block.entity_type,
            expr: expr_text(block.expr),
            description: block.description,
            label: block.label,
            config: Config::default(),
        };
        Ok(Unresolved::new(entity, layers))
    }

    fn metric(&self, block: MetricBlock) -> Result<Unresolved<Metric>> {
        check_name("metric", &block.name, self.path())?;
        let layers = self.layers(EntityKind::Metric, &block.name, &block.inline())?;
        let (measures, input_metrics) = self.metric_inputs(&block)?;

        let metric = Metric {
            name: block.name,
            package: self.project.name.clone(),
            original_file_path: self.path().to_string(),
            metric_type: block.metric_type,
            label: block.label,
            description: block.description,
            filter: expr_text(block.filter),
            measures,
            input_metrics,
            config: Config::default(),
        };
        Ok(Unresolved::new(metric, layers))
    }

    /// Measure and metric references by metric type.
    fn metric_inputs(&self, block: &MetricBlock) -> std::result::Result<(Vec<String>, Vec<String>), ParsingError> {
        let params = &block.type_params;
        let missing = |param: &'static str| ParsingError::MissingTypeParam {
            metric: block.name.clone(),
            param,
            path: self.path().to_string(),
        };
        let names = |refs: &[&InputRef]| refs.iter().map(|r| r.name().to_string()).collect::<Vec<_>>();

        match block.metric_type {
            MetricType::Simple | MetricType::Cumulative => {
                let mut refs: Vec<&InputRef> = params.measure.iter().collect();
                refs.extend(params.measures.iter());
                if refs.is_empty() {
                    return Err(missing("measure"));
                }
                Ok((names(&refs), Vec::new()))
            }
            MetricType::Conversion => {
                let conversion = params
                    .conversion_type_params
                    .as_ref()
                    .ok_or_else(|| missing("conversion_type_params"))?;
                let base = conversion.base_measure.as_ref().ok_or_else(|| missing("base_measure"))?;
                let converted = conversion
                    .conversion_measure
                    .as_ref()
                    .ok_or_else(|| missing("conversion_measure"))?;
                Ok((names(&[base, converted]), Vec::new()))
            }
            MetricType::Ratio => {
                let numerator = params.numerator.as_ref().ok_or_else(|| missing("numerator"))?;
                let denominator = params.denominator.as_ref().ok_or_else(|| missing("denominator"))?;
                Ok((Vec::new(), names(&[numerator, denominator])))
            }
            MetricType::Derived => {
                if params.metrics.is_empty() {
                    return Err(missing("metrics"));
                }
                let refs: Vec<&InputRef> = params.metrics.iter().collect();
                Ok((Vec::new(), names(&refs)))
            }
        }
    }

    fn group(&self, block: GroupBlock) -> Result<Unresolved<Group>> {
        check_name("group", &block.name, self.path())?;
        let layers = self.layers(EntityKind::Group, &block.name, &block.inline())?;
        let group = Group {
            name: block.name,
            package: self.project.name.clone(),
            original_file_path: self.path().to_string(),
            owner: block.owner,
            description: block.description,
            config: Config::default(),
        };
        Ok(Unresolved::new(group, layers))
    }
}
