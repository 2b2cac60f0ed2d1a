//! Scoped configuration trees from the project file.
//!
//! Each entity kind has its own tree. Keys at any level that are config keys
//! (`enabled`, `group`, `meta`, or anything starting with `+`) configure that
//! level; other mapping-valued keys open a nested scope; other scalar keys
//! are extra config. The root level is the global layer, the first nested
//! level is the package, then one level per directory below the model path,
//! and finally the entity name.

use std::collections::BTreeMap;

use semantic_config::{ConfigFragment, ConfigOrigin, CONFIG_KEYS};
use serde_json::Value;

use super::ProjectError;

/// One level of a scoped config tree
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeTree {
    /// Config set at this level
    pub fragment: ConfigFragment,

    /// Nested scopes by key
    pub children: BTreeMap<String, ScopeTree>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self {
            fragment: ConfigFragment::new(ConfigOrigin::ProjectGlobal),
            children: BTreeMap::new(),
        }
    }
}

impl ScopeTree {
    /// Build the tree for one entity kind from its raw project-file section.
    pub fn from_value(section: &str, value: &Value) -> Result<Self, ProjectError> {
        Self::build(section, ConfigOrigin::ProjectGlobal, value)
    }

    fn build(scope: &str, origin: ConfigOrigin, value: &Value) -> Result<Self, ProjectError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(ProjectError::InvalidScope {
                    scope: scope.to_string(),
                    found: other.to_string(),
                })
            }
        };

        let mut config = serde_json::Map::new();
        let mut children = BTreeMap::new();
        for (key, v) in map {
            if key.starts_with('+') || CONFIG_KEYS.contains(&key.as_str()) || !v.is_object() {
                config.insert(key.clone(), v.clone());
            } else {
                let child_scope = format!("{}.{}", scope, key);
                children.insert(
                    key.clone(),
                    Self::build(&child_scope, ConfigOrigin::ProjectPath, v)?,
                );
            }
        }

        let fragment = ConfigFragment::from_value(origin, &Value::Object(config)).map_err(
            |source| ProjectError::Config {
                scope: scope.to_string(),
                source,
            },
        )?;

        Ok(Self { fragment, children })
    }

    /// Layers that apply to an entity, least specific first.
    ///
    /// `path` is the package followed by the directories below the model
    /// path and the entity name. Matching stops at the first missing level.
    /// Empty levels contribute nothing.
    pub fn layers_for<'a, I>(&self, path: I) -> Vec<ConfigFragment>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut layers = Vec::new();
        if !self.fragment.is_empty() {
            layers.push(self.fragment.clone());
        }

        let mut node = self;
        for key in path {
            match node.children.get(key) {
                Some(child) => {
                    if !child.fragment.is_empty() {
                        layers.push(child.fragment.clone());
                    }
                    node = child;
                }
                None => break,
            }
        }
        layers
    }

    /// True if no level of the tree sets anything.
    pub fn is_empty(&self) -> bool {
        self.fragment.is_empty() && self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_keys_and_scopes() {
        let tree = ScopeTree::from_value(
            "semantic-models",
            &json!({
                "enabled": false,
                "test": {
                    "+group": "finance",
                    "marts": {"meta": {"owner": "analytics"}}
                }
            }),
        )
        .unwrap();

        assert_eq!(tree.fragment.enabled, Some(false));
        assert_eq!(tree.fragment.origin, ConfigOrigin::ProjectGlobal);

        let package = &tree.children["test"];
        assert_eq!(package.fragment.group.as_deref(), Some("finance"));
        assert_eq!(package.fragment.origin, ConfigOrigin::ProjectPath);

        let marts = &package.children["marts"];
        assert_eq!(marts.fragment.meta["owner"], "analytics");
    }

    #[test]
    fn test_layers_for_path() {
        let tree = ScopeTree::from_value(
            "metrics",
            &json!({
                "enabled": true,
                "test": {
                    "enabled": false,
                    "marts": {"group": "finance"},
                    "staging": {"group": "ops"}
                }
            }),
        )
        .unwrap();

        let layers = tree.layers_for(["test", "marts", "revenue"]);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].enabled, Some(true));
        assert_eq!(layers[1].enabled, Some(false));
        assert_eq!(layers[2].group.as_deref(), Some("finance"));

        let other_package = tree.layers_for(["other", "marts"]);
        assert_eq!(other_package.len(), 1);
    }

    #[test]
    fn test_entity_name_scope() {
        let tree = ScopeTree::from_value(
            "semantic-models",
            &json!({"test": {"semantic_people": {"+enabled": false}}}),
        )
        .unwrap();

        let layers = tree.layers_for(["test", "semantic_people"]);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].enabled, Some(false));
    }

    #[test]
    fn test_scalar_section_rejected() {
        let err = ScopeTree::from_value("metrics", &json!(true)).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidScope { .. }));
    }

    #[test]
    fn test_bad_config_type_names_scope() {
        let err = ScopeTree::from_value("metrics", &json!({"test": {"enabled": "yes"}}))
            .unwrap_err();
        assert!(err.to_string().contains("metrics.test"));
    }
}
