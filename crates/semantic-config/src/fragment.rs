//! Config fragments: one layer of configuration before merging.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{value_kind, ConfigError};
use crate::Meta;

/// Keys with dedicated handling in a fragment. Everything else lands in
/// [`ConfigFragment::extra`].
pub const CONFIG_KEYS: &[&str] = &["enabled", "group", "meta"];

/// Where a configuration layer came from, least specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrigin {
    /// Root of a kind's tree in the project file
    ProjectGlobal,
    /// Package or directory scope in the project file
    ProjectPath,
    /// Owning semantic model's resolved meta, beneath a sub-component
    Inherited,
    /// Block-level properties and `config:` in the declaring document
    Inline,
    /// A sub-component's own `config:`
    Component,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigOrigin::ProjectGlobal => "project",
            ConfigOrigin::ProjectPath => "project path",
            ConfigOrigin::Inherited => "inherited",
            ConfigOrigin::Inline => "inline",
            ConfigOrigin::Component => "component",
        };
        f.write_str(name)
    }
}

/// One layer of configuration. Absent fields mean "inherit".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFragment {
    /// Origin of the most specific contributing layer
    pub origin: ConfigOrigin,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,

    /// Any other config keys, merged under the same rules
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ConfigFragment {
    /// An empty fragment that contributes nothing.
    pub fn new(origin: ConfigOrigin) -> Self {
        Self {
            origin,
            enabled: None,
            group: None,
            meta: Meta::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Fragment carrying only meta, used for a sub-component's inherited layer.
    pub fn inherited_meta(meta: Meta) -> Self {
        Self {
            meta,
            ..Self::new(ConfigOrigin::Inherited)
        }
    }

    /// Build a typed fragment from a raw mapping.
    ///
    /// Keys may carry a leading `+`, which is stripped. `null` means an empty
    /// fragment, as does a `null` value for any single key.
    pub fn from_value(origin: ConfigOrigin, value: &Value) -> Result<Self, ConfigError> {
        let map = match value {
            Value::Null => return Ok(Self::new(origin)),
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::NotAMapping {
                    origin,
                    found: value_kind(other),
                })
            }
        };

        let mut fragment = Self::new(origin);
        for (raw_key, v) in map {
            let key = raw_key.strip_prefix('+').unwrap_or(raw_key);
            if v.is_null() {
                continue;
            }
            match key {
                "enabled" => {
                    let enabled = v
                        .as_bool()
                        .ok_or_else(|| mismatch(origin, key, "a boolean", v))?;
                    fragment.enabled = Some(enabled);
                }
                "group" => {
                    let group = v
                        .as_str()
                        .ok_or_else(|| mismatch(origin, key, "a string", v))?;
                    fragment.group = Some(group.to_string());
                }
                "meta" => {
                    let meta = v
                        .as_object()
                        .ok_or_else(|| mismatch(origin, key, "a mapping", v))?;
                    for (k, mv) in meta {
                        fragment.meta.insert(k.clone(), mv.clone());
                    }
                }
                _ => {
                    fragment.extra.insert(key.to_string(), v.clone());
                }
            }
        }
        Ok(fragment)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// True if this fragment would not change anything when merged.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.group.is_none()
            && self.meta.is_empty()
            && self.extra.is_empty()
    }
}

fn mismatch(origin: ConfigOrigin, field: &str, expected: &'static str, found: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        origin,
        field: field.to_string(),
        expected,
        found: value_kind(found),
    }
}
