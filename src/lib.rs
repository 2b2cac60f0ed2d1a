//! Semantic Manifest - layered config resolution for semantic-layer entities
//!
//! This crate reads a project's semantic models, metrics and groups from YAML
//! documents, resolves each entity's configuration from the project file and
//! its inline blocks, partitions entities into active and disabled sets, and
//! validates that active metrics only reference active measures.

pub mod clean;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod parser;
pub mod pipeline;
pub mod project;
pub mod validate;

pub use error::{Error, ParsingError, Result};
pub use manifest::{EntityKind, Manifest, Node, UniqueId};
pub use pipeline::{parse, parse_project, ProjectSnapshot, Reparser};
pub use project::{ProjectConfig, ProjectError};
pub use semantic_config::{Config, ConfigError, ConfigFragment, ConfigOrigin};
