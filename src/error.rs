//! Error types for semantic-manifest
//!
//! Two fatal kinds come out of a resolution pass: [`ParsingError`] for
//! malformed documents and broken references, and configuration errors from
//! the layered merge. Both abort the pass and leave no manifest behind.

use std::io;

use semantic_config::ConfigError;
use thiserror::Error;

use crate::clean::CleanError;
use crate::manifest::{EntityKind, UniqueId};
use crate::project::ProjectError;

/// Errors raised while reading entity documents or validating references
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParsingError {
    #[error("invalid document `{path}`: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("invalid {kind} name `{name}` in `{path}`: names may only contain letters, digits and underscores and must not start with a digit")]
    InvalidName {
        kind: &'static str,
        name: String,
        path: String,
    },

    #[error("semantic model `{model}` in `{path}` declares {component} `{name}` more than once")]
    DuplicateComponent {
        model: String,
        component: &'static str,
        name: String,
        path: String,
    },

    #[error("metric `{metric}` in `{path}` is missing required type param `{param}`")]
    MissingTypeParam {
        metric: String,
        param: &'static str,
        path: String,
    },

    #[error("{kind} `{id}` is defined twice: in `{first}` and in `{second}`")]
    DuplicateIdentity {
        kind: EntityKind,
        id: UniqueId,
        first: String,
        second: String,
    },

    #[error("metric `{metric}` references unknown measure `{measure}`")]
    UnknownMeasure { measure: String, metric: String },

    #[error("The measure `{measure}` is referenced on disabled semantic model `{model}`.")]
    DisabledReference {
        measure: String,
        model: String,
        metric: String,
    },

    #[error("metric `{metric}` references unknown metric `{input}`")]
    UnknownMetric { input: String, metric: String },

    #[error("The metric `{input}` referenced by metric `{metric}` is disabled.")]
    DisabledMetricReference { input: String, metric: String },
}

/// Top-level error for a resolution pass or CLI command
#[derive(Debug, Error)]
pub enum Error {
    #[error("parsing error: {0}")]
    Parsing(#[from] ParsingError),

    #[error("configuration error for {entity}: {source}")]
    Configuration {
        entity: String,
        #[source]
        source: ConfigError,
    },

    #[error("project error: {0}")]
    Project(#[from] ProjectError),

    #[error("clean error: {0}")]
    Clean(#[from] CleanError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a merge failure with the entity it was resolving.
    pub fn config(entity: impl Into<String>, source: ConfigError) -> Self {
        Error::Configuration {
            entity: entity.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Parsing(_) => 2,
            Error::Configuration { .. } => 3,
            Error::Project(_) => 1,
            Error::Clean(_) => 4,
            Error::Io(_) => 1,
            Error::Serialization(_) => 1,
        }
    }
}

/// Result type for resolution operations
pub type Result<T> = std::result::Result<T, Error>;
