//! Document discovery
//!
//! Walks each model path for `.yml`/`.yaml` files, skipping default
//! exclusions and the project's `exclude` globs.

use std::fs;
use std::path::{Component, Path};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ParsingError, Result};
use crate::project::{ProjectConfig, ProjectError};

/// Default patterns to exclude, relative to the project root
const DEFAULT_EXCLUDES: &[&str] = &[
    "target/**",
    "**/.*/**",
    "**/.*",
    "**/node_modules/**",
];

/// One entity document, read fully into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Project-relative path with `/` separators
    pub path: String,

    /// Directories between the model path and the file
    pub scope_dirs: Vec<String>,

    pub contents: String,
}

impl SourceDocument {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        let path = path.into();
        let scope_dirs = scope_dirs_for(&path);
        Self {
            path,
            scope_dirs,
            contents: contents.into(),
        }
    }
}

/// Directories of a relative path below its first component (the model path).
fn scope_dirs_for(path: &str) -> Vec<String> {
    let model_path = path.split('/').next().unwrap_or_default();
    scope_dirs_below(path, model_path)
}

/// Exclusion rules for document discovery
#[derive(Debug)]
pub struct ExcludeRules {
    glob_set: GlobSet,
}

impl ExcludeRules {
    /// Default exclusions plus additional patterns
    pub fn new(patterns: &[String]) -> std::result::Result<Self, ProjectError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_EXCLUDES {
            builder.add(Glob::new(pattern)?);
        }
        for pattern in patterns {
            if !pattern.is_empty() {
                builder.add(Glob::new(pattern)?);
            }
        }
        Ok(Self {
            glob_set: builder.build()?,
        })
    }

    /// Check if a project-relative path should be skipped
    pub fn is_excluded(&self, path: &str) -> bool {
        self.glob_set.is_match(path)
    }
}

fn is_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn to_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Find and read all entity documents, sorted by path.
///
/// A missing model path contributes nothing.
pub fn discover_documents(root: &Path, project: &ProjectConfig) -> Result<Vec<SourceDocument>> {
    let rules = ExcludeRules::new(&project.exclude)?;
    let mut documents = Vec::new();

    for model_path in &project.model_paths {
        let dir = root.join(model_path);
        if !dir.is_dir() {
            debug!(path = %dir.display(), "model path does not exist");
            continue;
        }

        for entry in WalkDir::new(&dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| ParsingError::InvalidDocument {
                path: dir.display().to_string(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() || !is_document(entry.path()) {
                continue;
            }
            let relative = to_relative(root, entry.path()).ok_or_else(|| ParsingError::InvalidDocument {
                path: entry.path().display().to_string(),
                message: "document is outside the project root".to_string(),
            })?;
            if rules.is_excluded(&relative) {
                debug!(path = %relative, "excluded");
                continue;
            }

            let contents = fs::read_to_string(entry.path())?;
            documents.push(SourceDocument {
                scope_dirs: scope_dirs_below(&relative, model_path),
                path: relative,
                contents,
            });
        }
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    documents.dedup_by(|a, b| a.path == b.path);
    Ok(documents)
}

/// Directories between `model_path` and the file name.
fn scope_dirs_below(relative: &str, model_path: &str) -> Vec<String> {
    let prefix_len = model_path
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .count();
    let mut parts: Vec<&str> = relative.split('/').collect();
    parts.pop();
    parts
        .into_iter()
        .skip(prefix_len)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn project(exclude: &[&str]) -> ProjectConfig {
        let mut project = ProjectConfig::parse("name = \"test\"").unwrap();
        project.exclude = exclude.iter().map(|s| s.to_string()).collect();
        project
    }

    #[test]
    fn test_scope_dirs() {
        let doc = SourceDocument::new("models/marts/finance/revenue.yml", "");
        assert_eq!(doc.scope_dirs, vec!["marts", "finance"]);

        assert!(SourceDocument::new("models/top.yml", "").scope_dirs.is_empty());
        assert_eq!(scope_dirs_below("semantic/layer/x/a.yml", "semantic/layer"), vec!["x"]);
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "models/b.yml", "groups: []");
        write(dir.path(), "models/marts/a.yaml", "metrics: []");
        write(dir.path(), "models/people.sql", "select 1");
        write(dir.path(), "models/.hidden/c.yml", "groups: []");
        write(dir.path(), "target/compiled.yml", "groups: []");

        let docs = discover_documents(dir.path(), &project(&[])).unwrap();
        let paths: Vec<&str> = docs.iter().map(|d| d.path.as_str()).collect();

        assert_eq!(paths, vec!["models/b.yml", "models/marts/a.yaml"]);
        assert_eq!(docs[1].scope_dirs, vec!["marts"]);
    }

    #[test]
    fn test_project_excludes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "models/keep.yml", "groups: []");
        write(dir.path(), "models/scratch/skip.yml", "groups: []");

        let docs = discover_documents(dir.path(), &project(&["models/scratch/**"])).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "models/keep.yml");
    }

    #[test]
    fn test_missing_model_path() {
        let dir = tempfile::tempdir().unwrap();
        let docs = discover_documents(dir.path(), &project(&[])).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_bad_glob() {
        assert!(ExcludeRules::new(&["models/[".to_string()]).is_err());
    }
}
