//! Manifest builder
//!
//! Takes unresolved records from the parser, merges each record's config
//! layers, and partitions semantic models and metrics into `active` and
//! `disabled`.
//!
//! Build order:
//! 1. Sort records by package, then kind, then name (then file path)
//! 2. Merge each record's layers into a resolved config
//! 3. Merge each sub-component's layers beneath the owner's resolved meta
//! 4. Insert into the bucket picked by `enabled`; groups always go to `groups`
//!
//! A duplicate id within a kind fails the build. Nothing is overwritten.

use std::collections::BTreeMap;

use semantic_config::{resolve_layers, Config, ConfigFragment};
use tracing::{debug, info};

use super::entity::{
    Dimension, Entity, EntityKind, Group, Measure, Metric, Node, SemanticModel, UniqueId,
};
use super::Manifest;
use crate::error::{Error, ParsingError, Result};

/// An item awaiting config resolution, with its layers least specific first
#[derive(Debug, Clone, PartialEq)]
pub struct Unresolved<T> {
    pub item: T,
    pub layers: Vec<ConfigFragment>,
}

impl<T> Unresolved<T> {
    pub fn new(item: T, layers: Vec<ConfigFragment>) -> Self {
        Self { item, layers }
    }
}

/// A semantic model plus its sub-components, each with their own layers.
///
/// `model.item` carries empty component lists; the builder fills them once
/// the owner's config is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticModelRecord {
    pub model: Unresolved<SemanticModel>,
    pub dimensions: Vec<Unresolved<Dimension>>,
    pub measures: Vec<Unresolved<Measure>>,
    pub entities: Vec<Unresolved<Entity>>,
}

/// Parser output for one top-level entity
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    SemanticModel(SemanticModelRecord),
    Metric(Unresolved<Metric>),
    Group(Unresolved<Group>),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::SemanticModel(_) => EntityKind::SemanticModel,
            Record::Metric(_) => EntityKind::Metric,
            Record::Group(_) => EntityKind::Group,
        }
    }

    pub fn package(&self) -> &str {
        match self {
            Record::SemanticModel(r) => &r.model.item.package,
            Record::Metric(r) => &r.item.package,
            Record::Group(r) => &r.item.package,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::SemanticModel(r) => &r.model.item.name,
            Record::Metric(r) => &r.item.name,
            Record::Group(r) => &r.item.name,
        }
    }

    pub fn original_file_path(&self) -> &str {
        match self {
            Record::SemanticModel(r) => &r.model.item.original_file_path,
            Record::Metric(r) => &r.item.original_file_path,
            Record::Group(r) => &r.item.original_file_path,
        }
    }

    pub fn unique_id(&self) -> UniqueId {
        UniqueId::new(self.kind(), self.package(), self.name())
    }

    fn sort_key(&self) -> (&str, EntityKind, &str, &str) {
        (self.package(), self.kind(), self.name(), self.original_file_path())
    }
}

/// Builds a [`Manifest`] from parser records
#[derive(Debug)]
pub struct ManifestBuilder {
    manifest: Manifest,
    /// Declaring file per id, for duplicate diagnostics
    seen: BTreeMap<UniqueId, String>,
}

impl ManifestBuilder {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            manifest: Manifest::new(project_name),
            seen: BTreeMap::new(),
        }
    }

    /// Resolve and partition all records.
    pub fn build(mut self, mut records: Vec<Record>) -> Result<Manifest> {
        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        for record in records {
            let id = record.unique_id();
            self.claim(&id, record.kind(), record.original_file_path())?;

            match record {
                Record::SemanticModel(r) => {
                    let model = resolve_semantic_model(r)?;
                    self.insert_node(id, Node::SemanticModel(model));
                }
                Record::Metric(r) => {
                    let mut metric = r.item;
                    metric.config = resolve(r.layers, EntityKind::Metric, &metric.name)?;
                    self.insert_node(id, Node::Metric(metric));
                }
                Record::Group(r) => {
                    let mut group = r.item;
                    group.config = resolve(r.layers, EntityKind::Group, &group.name)?;
                    debug!(id = %id, "recorded group");
                    self.manifest.groups.insert(id, group);
                }
            }
        }

        let counts = self.manifest.counts();
        info!(
            semantic_models = counts.semantic_models,
            metrics = counts.metrics,
            groups = counts.groups,
            disabled = counts.disabled,
            "built manifest"
        );
        Ok(self.manifest)
    }

    fn claim(&mut self, id: &UniqueId, kind: EntityKind, path: &str) -> Result<()> {
        if let Some(first) = self.seen.get(id) {
            return Err(ParsingError::DuplicateIdentity {
                kind,
                id: id.clone(),
                first: first.clone(),
                second: path.to_string(),
            }
            .into());
        }
        self.seen.insert(id.clone(), path.to_string());
        Ok(())
    }

    fn insert_node(&mut self, id: UniqueId, node: Node) {
        if node.config().enabled {
            debug!(id = %id, group = ?node.config().group, "active");
            self.manifest.active.insert(id, node);
        } else {
            debug!(id = %id, "disabled");
            self.manifest.disabled.insert(id, node);
        }
    }
}

fn resolve(layers: Vec<ConfigFragment>, kind: EntityKind, name: &str) -> Result<Config> {
    resolve_layers(layers).map_err(|source| Error::config(format!("{} `{}`", kind, name), source))
}

fn resolve_semantic_model(record: SemanticModelRecord) -> Result<SemanticModel> {
    let mut model = record.model.item;
    model.config = resolve(record.model.layers, EntityKind::SemanticModel, &model.name)?;

    model.dimensions = resolve_components(record.dimensions, &model)?;
    model.measures = resolve_components(record.measures, &model)?;
    model.entities = resolve_components(record.entities, &model)?;
    Ok(model)
}

/// Sub-component of a semantic model whose config is resolved by the builder
trait Component {
    const KIND: &'static str;
    fn name(&self) -> &str;
    fn set_config(&mut self, config: Config);
}

impl Component for Dimension {
    const KIND: &'static str = "dimension";
    fn name(&self) -> &str {
        &self.name
    }
    fn set_config(&mut self, config: Config) {
        self.config = config;
    }
}

impl Component for Measure {
    const KIND: &'static str = "measure";
    fn name(&self) -> &str {
        &self.name
    }
    fn set_config(&mut self, config: Config) {
        self.config = config;
    }
}

impl Component for Entity {
    const KIND: &'static str = "entity";
    fn name(&self) -> &str {
        &self.name
    }
    fn set_config(&mut self, config: Config) {
        self.config = config;
    }
}

/// Resolve sub-components with the owner's meta as the least specific layer.
fn resolve_components<T: Component>(
    components: Vec<Unresolved<T>>,
    owner: &SemanticModel,
) -> Result<Vec<T>> {
    components
        .into_iter()
        .map(|c| {
            let mut item = c.item;
            let layers = std::iter::once(owner.config.inherited_layer()).chain(c.layers);
            let config = resolve_layers(layers).map_err(|source| {
                Error::config(
                    format!("{} `{}` of semantic model `{}`", T::KIND, item.name(), owner.name),
                    source,
                )
            })?;
            item.set_config(config);
            Ok(item)
        })
        .collect()
}
