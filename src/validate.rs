//! Cross-reference validation
//!
//! Runs after partitioning. Every active metric must reference measures
//! declared on an active semantic model, and input metrics that are active.
//! Disabled metrics are not checked. The first violation fails the pass.

use tracing::debug;

use crate::error::ParsingError;
use crate::manifest::{Manifest, Metric, SemanticModel};

/// Where a measure name was found
enum MeasureOwner<'a> {
    Active,
    Disabled(&'a SemanticModel),
    Missing,
}

fn find_measure_owner<'a>(manifest: &'a Manifest, measure: &str) -> MeasureOwner<'a> {
    if manifest.semantic_models().any(|m| m.has_measure(measure)) {
        return MeasureOwner::Active;
    }
    match manifest.disabled_semantic_models().find(|m| m.has_measure(measure)) {
        Some(model) => MeasureOwner::Disabled(model),
        None => MeasureOwner::Missing,
    }
}

fn check_measures(manifest: &Manifest, metric: &Metric) -> Result<(), ParsingError> {
    for measure in &metric.measures {
        match find_measure_owner(manifest, measure) {
            MeasureOwner::Active => {}
            MeasureOwner::Disabled(model) => {
                return Err(ParsingError::DisabledReference {
                    measure: measure.clone(),
                    model: model.name.clone(),
                    metric: metric.name.clone(),
                })
            }
            MeasureOwner::Missing => {
                return Err(ParsingError::UnknownMeasure {
                    measure: measure.clone(),
                    metric: metric.name.clone(),
                })
            }
        }
    }
    Ok(())
}

fn check_input_metrics(manifest: &Manifest, metric: &Metric) -> Result<(), ParsingError> {
    for input in &metric.input_metrics {
        if manifest.metrics().any(|m| &m.name == input) {
            continue;
        }
        if manifest.disabled_metrics().any(|m| &m.name == input) {
            return Err(ParsingError::DisabledMetricReference {
                input: input.clone(),
                metric: metric.name.clone(),
            });
        }
        return Err(ParsingError::UnknownMetric {
            input: input.clone(),
            metric: metric.name.clone(),
        });
    }
    Ok(())
}

/// Check every active metric's references, in id order.
pub fn validate(manifest: &Manifest) -> Result<(), ParsingError> {
    for metric in manifest.metrics() {
        check_measures(manifest, metric)?;
        check_input_metrics(manifest, metric)?;
    }
    debug!(metrics = manifest.metrics().count(), "references valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{
        Aggregation, Measure, MetricType, Node, SemanticModel, UniqueId, EntityKind,
    };
    use semantic_config::Config;

    fn disabled() -> Config {
        Config {
            enabled: false,
            ..Config::default()
        }
    }

    fn model(name: &str, measures: &[&str], config: Config) -> Node {
        Node::SemanticModel(SemanticModel {
            name: name.to_string(),
            package: "test".to_string(),
            original_file_path: "models/semantic_models.yml".to_string(),
            model: None,
            description: None,
            label: None,
            agg_time_dimension: None,
            primary_entity: None,
            dimensions: Vec::new(),
            measures: measures
                .iter()
                .map(|m| Measure {
                    name: m.to_string(),
                    agg: Aggregation::Count,
                    expr: None,
                    description: None,
                    label: None,
                    agg_time_dimension: None,
                    config: Config::default(),
                })
                .collect(),
            entities: Vec::new(),
            config,
        })
    }

    fn metric(name: &str, measures: &[&str], inputs: &[&str], config: Config) -> Node {
        Node::Metric(Metric {
            name: name.to_string(),
            package: "test".to_string(),
            original_file_path: "models/metrics.yml".to_string(),
            metric_type: if inputs.is_empty() {
                MetricType::Simple
            } else {
                MetricType::Derived
            },
            label: None,
            description: None,
            filter: None,
            measures: measures.iter().map(|m| m.to_string()).collect(),
            input_metrics: inputs.iter().map(|m| m.to_string()).collect(),
            config,
        })
    }

    fn manifest(nodes: Vec<Node>) -> Manifest {
        let mut manifest = Manifest::new("test");
        for node in nodes {
            let id = node.unique_id();
            if node.config().enabled {
                manifest.active.insert(id, node);
            } else {
                manifest.disabled.insert(id, node);
            }
        }
        manifest
    }

    #[test]
    fn test_active_references_pass() {
        let m = manifest(vec![
            model("semantic_people", &["people"], Config::default()),
            metric("number_of_people", &["people"], &[], Config::default()),
            metric("people_growth", &[], &["number_of_people"], Config::default()),
        ]);
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn test_disabled_owner_message() {
        let m = manifest(vec![
            model("semantic_people", &["people"], disabled()),
            metric("number_of_people", &["people"], &[], Config::default()),
        ]);
        let err = validate(&m).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The measure `people` is referenced on disabled semantic model `semantic_people`."
        );
    }

    #[test]
    fn test_disabled_metric_not_checked() {
        let m = manifest(vec![
            model("semantic_people", &["people"], disabled()),
            metric("number_of_people", &["people"], &[], disabled()),
        ]);
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn test_active_owner_preferred() {
        let m = manifest(vec![
            model("archived_people", &["people"], disabled()),
            model("semantic_people", &["people"], Config::default()),
            metric("number_of_people", &["people"], &[], Config::default()),
        ]);
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn test_unknown_measure() {
        let m = manifest(vec![metric("revenue", &["amount"], &[], Config::default())]);
        assert_eq!(
            validate(&m).unwrap_err(),
            ParsingError::UnknownMeasure {
                measure: "amount".to_string(),
                metric: "revenue".to_string(),
            }
        );
    }

    #[test]
    fn test_input_metric_gating() {
        let m = manifest(vec![
            model("semantic_people", &["people"], Config::default()),
            metric("number_of_people", &["people"], &[], disabled()),
            metric("people_growth", &[], &["number_of_people"], Config::default()),
        ]);
        assert!(matches!(
            validate(&m).unwrap_err(),
            ParsingError::DisabledMetricReference { .. }
        ));

        let m = manifest(vec![metric("ratio", &[], &["missing"], Config::default())]);
        assert!(matches!(validate(&m).unwrap_err(), ParsingError::UnknownMetric { .. }));
    }

    #[test]
    fn test_unique_id_lookup() {
        let m = manifest(vec![model("semantic_people", &["people"], disabled())]);
        let id = UniqueId::new(EntityKind::SemanticModel, "test", "semantic_people");
        assert!(m.is_disabled(id.as_str()));
    }
}
