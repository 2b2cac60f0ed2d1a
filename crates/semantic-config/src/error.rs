//! Configuration errors.

use crate::fragment::ConfigOrigin;

/// Errors raised while building or merging configuration fragments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{origin} config must be a mapping, found {found}")]
    NotAMapping { origin: ConfigOrigin, found: String },

    #[error("{origin} config: `{field}` must be {expected}, found {found}")]
    TypeMismatch {
        origin: ConfigOrigin,
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("config field `{field}` is a mapping in one layer and a scalar in another ({base} vs {overlay})")]
    IncompatibleLayers {
        field: String,
        base: ConfigOrigin,
        overlay: ConfigOrigin,
    },
}

/// Short type name for a JSON value, used in error messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "a mapping",
    }
    .to_string()
}
