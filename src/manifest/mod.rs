//! The resolved, partitioned manifest
//!
//! A manifest holds every entity of one resolution pass. Semantic models and
//! metrics are either `active` or `disabled`, never both. Groups are kept
//! separately and unconditionally.

mod build;
mod entity;

pub use build::{ManifestBuilder, Record, SemanticModelRecord, Unresolved};
pub use entity::{
    Aggregation, Dimension, DimensionType, Entity, EntityKind, EntityType, Group, Measure,
    Metric, MetricType, Node, Owner, SemanticModel, UniqueId,
};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Schema identifier for serialized manifests
pub const SCHEMA_ID: &str = "semantic-manifest/manifest@1";

/// Resolved entities for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_id: String,

    /// Package name of the project
    pub project_name: String,

    pub active: BTreeMap<UniqueId, Node>,
    pub disabled: BTreeMap<UniqueId, Node>,
    pub groups: BTreeMap<UniqueId, Group>,
}

/// Bucket sizes, for summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ManifestCounts {
    pub semantic_models: usize,
    pub metrics: usize,
    pub groups: usize,
    pub disabled: usize,
}

impl Manifest {
    /// An empty manifest for a project
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            schema_id: SCHEMA_ID.to_string(),
            project_name: project_name.into(),
            active: BTreeMap::new(),
            disabled: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    pub fn get_active(&self, id: &str) -> Option<&Node> {
        self.active.get(id)
    }

    pub fn get_disabled(&self, id: &str) -> Option<&Node> {
        self.disabled.get(id)
    }

    pub fn get_group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Active semantic model by id
    pub fn semantic_model(&self, id: &str) -> Option<&SemanticModel> {
        self.get_active(id).and_then(Node::as_semantic_model)
    }

    /// Active metric by id
    pub fn metric(&self, id: &str) -> Option<&Metric> {
        self.get_active(id).and_then(Node::as_metric)
    }

    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.contains_key(id)
    }

    /// Active semantic models in id order
    pub fn semantic_models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.active.values().filter_map(Node::as_semantic_model)
    }

    /// Active metrics in id order
    pub fn metrics(&self) -> impl Iterator<Item = &Metric> {
        self.active.values().filter_map(Node::as_metric)
    }

    /// Disabled semantic models in id order
    pub fn disabled_semantic_models(&self) -> impl Iterator<Item = &SemanticModel> {
        self.disabled.values().filter_map(Node::as_semantic_model)
    }

    /// Disabled metrics in id order
    pub fn disabled_metrics(&self) -> impl Iterator<Item = &Metric> {
        self.disabled.values().filter_map(Node::as_metric)
    }

    pub fn counts(&self) -> ManifestCounts {
        ManifestCounts {
            semantic_models: self.semantic_models().count(),
            metrics: self.metrics().count(),
            groups: self.groups.len(),
            disabled: self.disabled.len(),
        }
    }

    /// SHA-256 hex digest of the canonical (RFC 8785) JSON form.
    ///
    /// Two passes over unchanged inputs produce the same digest.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(self)
            .map_err(|e| serde_json::Error::custom(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Serialize to JSON (pretty printed)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }
}
