//! Resolved configuration attached to a finalized entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fragment::ConfigFragment;
use crate::Meta;

/// Fully merged configuration with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub enabled: bool,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            group: None,
            meta: Meta::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl ConfigFragment {
    /// Apply defaults: enabled unless some layer said otherwise.
    pub fn resolve(self) -> Config {
        Config {
            enabled: self.enabled.unwrap_or(true),
            group: self.group,
            meta: self.meta,
            extra: self.extra,
        }
    }
}

impl Config {
    /// Layer carrying this config's meta for a sub-component to inherit.
    pub fn inherited_layer(&self) -> ConfigFragment {
        ConfigFragment::inherited_meta(self.meta.clone())
    }

    /// Look up a meta value by key.
    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    /// Look up a meta value as a string.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(|v| v.as_str())
    }
}
