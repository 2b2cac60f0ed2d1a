//! Clean targets
//!
//! `clean` removes the project's `clean-targets`. A target must sit strictly
//! inside the project root and must not be one of the model paths.

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::project::ProjectConfig;

/// Errors that can occur when validating or removing clean targets
#[derive(Debug, Error)]
pub enum CleanError {
    #[error("will not clean the following directories outside the project: {}", .0.join(", "))]
    OutsideProject(Vec<String>),

    #[error("will not clean the following source paths: {}", .0.join(", "))]
    SourcePaths(Vec<String>),

    #[error("failed to clean `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn absolute(root: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        normalize(target)
    } else {
        normalize(&root.join(target))
    }
}

/// Check targets against the project root and its source paths.
///
/// `root` should be absolute. Returns the absolute paths to remove, in target order.
pub fn validate_targets(
    root: &Path,
    targets: &[String],
    source_paths: &[String],
) -> Result<Vec<PathBuf>, CleanError> {
    let root = normalize(root);

    let outside: Vec<String> = targets
        .iter()
        .filter(|t| {
            let path = absolute(&root, t);
            path == root || !path.starts_with(&root)
        })
        .cloned()
        .collect();
    if !outside.is_empty() {
        return Err(CleanError::OutsideProject(outside));
    }

    let sources: Vec<PathBuf> = source_paths.iter().map(|s| absolute(&root, s)).collect();
    let protected: Vec<String> = targets
        .iter()
        .filter(|t| sources.contains(&absolute(&root, t)))
        .cloned()
        .collect();
    if !protected.is_empty() {
        return Err(CleanError::SourcePaths(protected));
    }

    Ok(targets.iter().map(|t| absolute(&root, t)).collect())
}

/// Validate and remove the project's clean targets.
///
/// Returns the directories actually removed. Missing targets are skipped.
pub fn clean(root: &Path, project: &ProjectConfig, dry_run: bool) -> Result<Vec<PathBuf>, CleanError> {
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| CleanError::Io {
                path: root.to_path_buf(),
                source,
            })?
            .join(root)
    };
    let targets = validate_targets(&root, &project.clean_targets, &project.model_paths)?;
    let mut removed = Vec::new();

    for target in targets {
        if !target.exists() {
            debug!(path = %target.display(), "clean target does not exist");
            continue;
        }
        if !dry_run {
            let result = if target.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            result.map_err(|source| CleanError::Io {
                path: target.clone(),
                source,
            })?;
        }
        info!(path = %target.display(), dry_run, "cleaned");
        removed.push(target);
    }
    Ok(removed)
}
