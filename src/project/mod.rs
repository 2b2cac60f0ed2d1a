//! Project configuration
//!
//! Parses `project.toml` at the project root. Besides the package name and
//! paths it carries one scoped config tree per entity kind:
//! `[semantic-models]`, `[metrics]` and `[groups]`.

mod scope;

pub use scope::ScopeTree;

use std::fs;
use std::path::{Component, Path, PathBuf};

use semantic_config::ConfigError;
use serde::Deserialize;
use serde_json::Value;

use crate::manifest::EntityKind;

/// File name of the project configuration
pub const PROJECT_FILE: &str = "project.toml";

/// Errors that can occur when loading project configuration
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML in `{path}`: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid project file: {0}")]
    Invalid(String),

    #[error("`{scope}` must be a table of config and scopes, found {found}")]
    InvalidScope { scope: String, found: String },

    #[error("invalid config in `{scope}`: {source}")]
    Config {
        scope: String,
        #[source]
        source: ConfigError,
    },

    #[error("invalid exclude pattern: {0}")]
    Glob(#[from] globset::Error),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawProjectConfig {
    name: String,

    #[serde(default = "default_model_paths")]
    model_paths: Vec<String>,

    #[serde(default = "default_clean_targets")]
    clean_targets: Vec<String>,

    #[serde(default)]
    exclude: Vec<String>,

    #[serde(default)]
    semantic_models: Value,

    #[serde(default)]
    metrics: Value,

    #[serde(default)]
    groups: Value,
}

fn default_model_paths() -> Vec<String> {
    vec!["models".to_string()]
}

fn default_clean_targets() -> Vec<String> {
    vec!["target".to_string()]
}

/// Immutable project configuration for one resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Package name, used in unique ids and as the first scope key
    pub name: String,

    /// Directories (relative to the root) holding entity documents
    pub model_paths: Vec<String>,

    /// Directories removed by `clean`
    pub clean_targets: Vec<String>,

    /// Glob patterns (relative to the root) skipped during discovery
    pub exclude: Vec<String>,

    pub semantic_models: ScopeTree,
    pub metrics: ScopeTree,
    pub groups: ScopeTree,
}

impl ProjectConfig {
    /// Load `project.toml` from a project root
    pub fn load(root: &Path) -> Result<Self, ProjectError> {
        let (path, contents) = read_project_file(root)?;
        Self::parse_at(&path, &contents)
    }

    /// Parse project configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self, ProjectError> {
        Self::parse_at(Path::new(PROJECT_FILE), contents)
    }

    /// Parse project configuration read from `path`
    pub fn parse_at(path: &Path, contents: &str) -> Result<Self, ProjectError> {
        let toml_value: toml::Value =
            toml::from_str(contents).map_err(|source| ProjectError::Toml {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(toml_to_json(toml_value))
    }

    /// Build from an already-converted JSON value
    pub fn from_value(value: Value) -> Result<Self, ProjectError> {
        let raw: RawProjectConfig =
            serde_json::from_value(value).map_err(|e| ProjectError::Invalid(e.to_string()))?;

        if raw.name.trim().is_empty() {
            return Err(ProjectError::Invalid("`name` must not be empty".to_string()));
        }
        for model_path in &raw.model_paths {
            let path = Path::new(model_path);
            if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
                return Err(ProjectError::Invalid(format!(
                    "model path `{}` must be relative to the project root",
                    model_path
                )));
            }
        }

        Ok(Self {
            semantic_models: ScopeTree::from_value("semantic-models", &raw.semantic_models)?,
            metrics: ScopeTree::from_value("metrics", &raw.metrics)?,
            groups: ScopeTree::from_value("groups", &raw.groups)?,
            name: raw.name,
            model_paths: raw.model_paths,
            clean_targets: raw.clean_targets,
            exclude: raw.exclude,
        })
    }

    /// Config tree for an entity kind
    pub fn scope(&self, kind: EntityKind) -> &ScopeTree {
        match kind {
            EntityKind::SemanticModel => &self.semantic_models,
            EntityKind::Metric => &self.metrics,
            EntityKind::Group => &self.groups,
        }
    }
}

/// Read `project.toml` under `root`, returning its path and contents
pub fn read_project_file(root: &Path) -> Result<(PathBuf, String), ProjectError> {
    let path = root.join(PROJECT_FILE);
    if !path.exists() {
        return Err(ProjectError::NotFound(path));
    }
    let contents = fs::read_to_string(&path).map_err(|source| ProjectError::Io {
        path: path.clone(),
        source,
    })?;
    Ok((path, contents))
}

/// Convert TOML Value to JSON Value
pub(crate) fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            Value::Object(map)
        }
    }
}
