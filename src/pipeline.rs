//! Resolution pipeline
//!
//! One pass reads an immutable [`ProjectSnapshot`], parses every document,
//! builds and partitions the manifest, then validates cross references:
//!
//! ```text
//! snapshot -> parse_documents -> ManifestBuilder::build -> validate
//! ```
//!
//! Every pass starts from scratch. A [`Reparser`] keeps the last published
//! manifest so a failed pass never replaces a good one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::Result;
use crate::manifest::{Manifest, ManifestBuilder};
use crate::parser::{discover_documents, parse_documents, SourceDocument};
use crate::project::{read_project_file, ProjectConfig};
use crate::validate::validate;

/// Everything one pass reads, loaded up front
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub root: PathBuf,
    pub project: ProjectConfig,
    pub documents: Vec<SourceDocument>,

    /// SHA-256 over the project file and every document
    pub fingerprint: String,
}

/// Canonical fingerprint inputs
#[derive(Serialize)]
struct FingerprintInputs<'a> {
    project_file: &'a str,
    documents: Vec<FingerprintDocument<'a>>,
}

#[derive(Serialize)]
struct FingerprintDocument<'a> {
    path: &'a str,
    contents: &'a str,
}

fn fingerprint(project_file: &str, documents: &[SourceDocument]) -> Result<String> {
    let inputs = FingerprintInputs {
        project_file,
        documents: documents
            .iter()
            .map(|d| FingerprintDocument {
                path: &d.path,
                contents: &d.contents,
            })
            .collect(),
    };
    let jcs_bytes = serde_json_canonicalizer::to_vec(&inputs)
        .map_err(|e| <serde_json::Error as serde::ser::Error>::custom(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}

impl ProjectSnapshot {
    /// Read `project.toml` and all entity documents under `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let (path, contents) = read_project_file(root)?;
        let project = ProjectConfig::parse_at(&path, &contents)?;
        let documents = discover_documents(root, &project)?;
        let fingerprint = fingerprint(&contents, &documents)?;

        debug!(
            root = %root.display(),
            documents = documents.len(),
            fingerprint = %fingerprint,
            "loaded project snapshot"
        );
        Ok(Self {
            root: root.to_path_buf(),
            project,
            documents,
            fingerprint,
        })
    }
}

/// Run one full resolution pass over a snapshot.
pub fn parse(snapshot: &ProjectSnapshot) -> Result<Manifest> {
    let records = parse_documents(&snapshot.project, &snapshot.documents)?;
    let manifest = ManifestBuilder::new(snapshot.project.name.clone()).build(records)?;
    validate(&manifest)?;
    Ok(manifest)
}

/// Load and resolve the project at `root`.
pub fn parse_project(root: &Path) -> Result<Manifest> {
    parse(&ProjectSnapshot::load(root)?)
}

/// Re-runs resolution for one project and publishes successful results
#[derive(Debug)]
pub struct Reparser {
    root: PathBuf,
    last_fingerprint: Option<String>,
    /// Inputs of the most recent failed pass, cleared on success
    failed_fingerprint: Option<String>,
    manifest: Option<Arc<Manifest>>,
}

impl Reparser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last_fingerprint: None,
            failed_fingerprint: None,
            manifest: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The last successfully published manifest
    pub fn current(&self) -> Option<Arc<Manifest>> {
        self.manifest.clone()
    }

    /// Rebuild unconditionally.
    ///
    /// On error the previously published manifest stays current.
    pub fn reparse(&mut self) -> Result<Arc<Manifest>> {
        let snapshot = ProjectSnapshot::load(&self.root)?;
        self.publish(snapshot)
    }

    /// Rebuild only if the project's inputs changed since the last pass.
    ///
    /// Returns `None` when the inputs match the last published manifest or
    /// the last failed pass, so a failure is reported once per input state.
    pub fn reparse_if_changed(&mut self) -> Result<Option<Arc<Manifest>>> {
        let snapshot = ProjectSnapshot::load(&self.root)?;
        let fingerprint = Some(snapshot.fingerprint.as_str());
        if self.manifest.is_some() && self.last_fingerprint.as_deref() == fingerprint {
            debug!(fingerprint = %snapshot.fingerprint, "inputs unchanged");
            self.failed_fingerprint = None;
            return Ok(None);
        }
        if self.failed_fingerprint.as_deref() == fingerprint {
            debug!(fingerprint = %snapshot.fingerprint, "inputs unchanged since failed pass");
            return Ok(None);
        }
        self.publish(snapshot).map(Some)
    }

    fn publish(&mut self, snapshot: ProjectSnapshot) -> Result<Arc<Manifest>> {
        let manifest = match parse(&snapshot) {
            Ok(manifest) => Arc::new(manifest),
            Err(e) => {
                self.failed_fingerprint = Some(snapshot.fingerprint);
                return Err(e);
            }
        };
        let counts = manifest.counts();
        info!(
            project = %manifest.project_name,
            semantic_models = counts.semantic_models,
            metrics = counts.metrics,
            disabled = counts.disabled,
            "published manifest"
        );
        self.last_fingerprint = Some(snapshot.fingerprint);
        self.failed_fingerprint = None;
        self.manifest = Some(Arc::clone(&manifest));
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    const MODELS: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    measures:
      - name: people
        agg: count
        expr: 1
metrics:
  - name: number_of_people
    type: simple
    type_params:
      measure: people
"#;

    #[test]
    fn test_parse_project() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project.toml", "name = \"test\"\n");
        write(dir.path(), "models/people.yml", MODELS);

        let manifest = parse_project(dir.path()).unwrap();
        assert!(manifest.semantic_model("semantic_model.test.semantic_people").is_some());
        assert!(manifest.metric("metric.test.number_of_people").is_some());
    }

    #[test]
    fn test_fingerprint_tracks_contents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project.toml", "name = \"test\"\n");
        write(dir.path(), "models/people.yml", MODELS);

        let first = ProjectSnapshot::load(dir.path()).unwrap();
        let again = ProjectSnapshot::load(dir.path()).unwrap();
        assert_eq!(first.fingerprint, again.fingerprint);

        write(dir.path(), "project.toml", "name = \"test\"\n[metrics]\nenabled = false\n");
        let changed = ProjectSnapshot::load(dir.path()).unwrap();
        assert_ne!(first.fingerprint, changed.fingerprint);
    }

    #[test]
    fn test_failed_pass_keeps_previous_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project.toml", "name = \"test\"\n");
        write(dir.path(), "models/people.yml", MODELS);

        let mut reparser = Reparser::new(dir.path());
        let first = reparser.reparse().unwrap();

        write(
            dir.path(),
            "project.toml",
            "name = \"test\"\n[semantic-models]\nenabled = false\n",
        );
        let err = reparser.reparse().unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let current = reparser.current().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[test]
    fn test_failed_inputs_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project.toml", "name = \"test\"\n");
        write(dir.path(), "models/people.yml", MODELS);

        let mut reparser = Reparser::new(dir.path());
        let first = reparser.reparse().unwrap();

        write(dir.path(), "models/people.yml", "semantic_models:\n  - model: ref('people')\n");
        assert!(reparser.reparse_if_changed().is_err());
        assert!(reparser.reparse_if_changed().unwrap().is_none());
        assert!(reparser.reparse_if_changed().unwrap().is_none());
        assert!(Arc::ptr_eq(&first, &reparser.current().unwrap()));

        write(dir.path(), "models/people.yml", MODELS);
        assert!(reparser.reparse_if_changed().unwrap().is_none());

        write(dir.path(), "models/people.yml", "semantic_models:\n  - model: ref('people')\n");
        assert!(reparser.reparse_if_changed().is_err());
    }

    #[test]
    fn test_reparse_if_changed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "project.toml", "name = \"test\"\n");
        write(dir.path(), "models/people.yml", MODELS);

        let mut reparser = Reparser::new(dir.path());
        assert!(reparser.reparse_if_changed().unwrap().is_some());
        assert!(reparser.reparse_if_changed().unwrap().is_none());

        write(dir.path(), "project.toml", "name = \"test\"\n[metrics]\nenabled = false\n");
        let rebuilt = reparser.reparse_if_changed().unwrap().unwrap();
        assert!(rebuilt.metric("metric.test.number_of_people").is_none());
    }
}
