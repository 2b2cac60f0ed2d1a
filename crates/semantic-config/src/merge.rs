//! Configuration merge logic
//!
//! Merge semantics:
//! - Scalars: override (last present wins)
//! - `meta`: union by key, overlay wins per key
//! - Extra dict values: union by key, overlay wins per key
//! - Extra dict vs scalar for the same key: error

use serde_json::Value;

use crate::error::ConfigError;
use crate::fragment::{ConfigFragment, ConfigOrigin};
use crate::resolved::Config;

impl ConfigFragment {
    /// Merge a more specific fragment on top of this one.
    pub fn merge(self, overlay: ConfigFragment) -> Result<ConfigFragment, ConfigError> {
        let base_origin = self.origin;
        let mut meta = self.meta;
        meta.extend(overlay.meta);

        let mut extra = self.extra;
        for (key, overlay_value) in overlay.extra {
            let merged = match extra.remove(&key) {
                Some(base_value) => {
                    merge_extra(&key, base_value, overlay_value, base_origin, overlay.origin)?
                }
                None => overlay_value,
            };
            extra.insert(key, merged);
        }

        Ok(ConfigFragment {
            origin: overlay.origin,
            enabled: overlay.enabled.or(self.enabled),
            group: overlay.group.or(self.group),
            meta,
            extra,
        })
    }
}

fn merge_extra(
    key: &str,
    base: Value,
    overlay: Value,
    base_origin: ConfigOrigin,
    overlay_origin: ConfigOrigin,
) -> Result<Value, ConfigError> {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                base_map.insert(k, v);
            }
            Ok(Value::Object(base_map))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => Err(ConfigError::IncompatibleLayers {
            field: key.to_string(),
            base: base_origin,
            overlay: overlay_origin,
        }),
        (_, overlay) => Ok(overlay),
    }
}

/// Merge layers in order (first is least specific, last has highest precedence).
pub fn merge_layers<I>(layers: I) -> Result<ConfigFragment, ConfigError>
where
    I: IntoIterator<Item = ConfigFragment>,
{
    let mut layers = layers.into_iter();
    let Some(first) = layers.next() else {
        return Ok(ConfigFragment::new(ConfigOrigin::ProjectGlobal));
    };
    layers.try_fold(first, ConfigFragment::merge)
}

/// Merge layers and apply defaults.
pub fn resolve_layers<I>(layers: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = ConfigFragment>,
{
    merge_layers(layers).map(ConfigFragment::resolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frag(origin: ConfigOrigin, value: Value) -> ConfigFragment {
        ConfigFragment::from_value(origin, &value).unwrap()
    }

    #[test]
    fn test_meta_per_key_override() {
        let base = frag(ConfigOrigin::ProjectGlobal, json!({"meta": {"a": 1, "b": 2}}));
        let overlay = frag(ConfigOrigin::Inline, json!({"meta": {"b": 3, "c": 4}}));
        let merged = base.merge(overlay).unwrap();

        assert_eq!(merged.meta["a"], 1);
        assert_eq!(merged.meta["b"], 3);
        assert_eq!(merged.meta["c"], 4);
        assert_eq!(merged.meta.len(), 3);
    }

    #[test]
    fn test_scalar_last_present_wins() {
        let layers = vec![
            ConfigFragment::new(ConfigOrigin::ProjectGlobal).with_enabled(false),
            ConfigFragment::new(ConfigOrigin::ProjectPath).with_enabled(false).with_group("a"),
            ConfigFragment::new(ConfigOrigin::Inline).with_enabled(true),
            ConfigFragment::new(ConfigOrigin::Component),
        ];
        let merged = merge_layers(layers).unwrap();

        assert_eq!(merged.enabled, Some(true));
        assert_eq!(merged.group.as_deref(), Some("a"));
        assert_eq!(merged.origin, ConfigOrigin::Component);
    }

    #[test]
    fn test_absent_layer_inherits() {
        let layers = vec![
            ConfigFragment::new(ConfigOrigin::ProjectGlobal).with_enabled(false),
            ConfigFragment::new(ConfigOrigin::Inline),
        ];
        let config = resolve_layers(layers).unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn test_associativity() {
        let a = frag(
            ConfigOrigin::ProjectGlobal,
            json!({"enabled": false, "meta": {"x": 1, "y": 1}, "docs": {"show": false}}),
        );
        let b = frag(
            ConfigOrigin::ProjectPath,
            json!({"group": "g1", "meta": {"y": 2}, "docs": {"node_color": "red"}}),
        );
        let c = frag(
            ConfigOrigin::Inline,
            json!({"enabled": true, "meta": {"z": 3}, "tag": "nightly"}),
        );

        let left = a.clone().merge(b.clone()).unwrap().merge(c.clone()).unwrap();
        let right = a.clone().merge(b.clone().merge(c.clone()).unwrap()).unwrap();
        let whole = merge_layers(vec![a, b, c]).unwrap();

        assert_eq!(left, right);
        assert_eq!(left, whole);
        assert_eq!(whole.extra["docs"], json!({"show": false, "node_color": "red"}));
    }

    #[test]
    fn test_dict_vs_scalar_is_error() {
        let base = frag(ConfigOrigin::ProjectGlobal, json!({"docs": {"show": true}}));
        let overlay = frag(ConfigOrigin::Inline, json!({"docs": "hidden"}));
        let err = base.merge(overlay).unwrap_err();

        assert_eq!(
            err,
            ConfigError::IncompatibleLayers {
                field: "docs".to_string(),
                base: ConfigOrigin::ProjectGlobal,
                overlay: ConfigOrigin::Inline,
            }
        );
    }

    #[test]
    fn test_extra_scalar_override() {
        let base = frag(ConfigOrigin::ProjectGlobal, json!({"materialized": "view"}));
        let overlay = frag(ConfigOrigin::Inline, json!({"materialized": "table"}));
        let merged = base.merge(overlay).unwrap();
        assert_eq!(merged.extra["materialized"], "table");
    }

    #[test]
    fn test_empty_layers_resolve_to_defaults() {
        let config = resolve_layers(Vec::new()).unwrap();
        assert!(config.enabled);
        assert!(config.group.is_none());
        assert!(config.meta.is_empty());
    }
}
