//! Per-run workspace lifecycle

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors creating or populating a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace at {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {path} into the workspace: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source directory does not exist: {0}")]
    MissingSource(PathBuf),
}

/// A throwaway directory for a single run.
///
/// Everything a run checks out or installs lands here. The directory is
/// removed when the workspace is dropped unless `keep()` was called, so
/// a finished run leaves nothing behind.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Create the workspace for a run under the system temp directory
    pub fn create(run_id: Uuid) -> Result<Self, WorkspaceError> {
        let root = std::env::temp_dir()
            .join("checkrun")
            .join(run_id.to_string());
        std::fs::create_dir_all(&root).map_err(|source| WorkspaceError::Create {
            path: root.clone(),
            source,
        })?;
        debug!("Created workspace {}", root.display());
        Ok(Self { root, keep: false })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Preserve the directory after the run, for debugging
    pub fn keep(&mut self) {
        self.keep = true;
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }

    /// Copy the source tree into `repo/` inside the workspace.
    /// `.git` is not copied; nothing in a run reads it.
    pub fn checkout_into(&self, source: &Path) -> Result<PathBuf, WorkspaceError> {
        if !source.is_dir() {
            return Err(WorkspaceError::MissingSource(source.to_path_buf()));
        }
        let dest = self.root.join("repo");
        copy_tree(source, &dest)?;
        debug!("Checked out {} into {}", source.display(), dest.display());
        Ok(dest)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if self.root.exists() {
                warn!("Failed to remove workspace {}: {}", self.root.display(), e);
            }
        } else {
            debug!("Removed workspace {}", self.root.display());
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), WorkspaceError> {
    std::fs::create_dir_all(to).map_err(|source| WorkspaceError::Create {
        path: to.to_path_buf(),
        source,
    })?;

    let entries = std::fs::read_dir(from).map_err(|source| WorkspaceError::Copy {
        path: from.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| WorkspaceError::Copy {
            path: from.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        if name == ".git" {
            continue;
        }

        let from_path = entry.path();
        let to_path = to.join(&name);
        let file_type = entry.file_type().map_err(|source| WorkspaceError::Copy {
            path: from_path.clone(),
            source,
        })?;

        if file_type.is_dir() {
            copy_tree(&from_path, &to_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&from_path, &to_path).map_err(|source| WorkspaceError::Copy {
                path: from_path.clone(),
                source,
            })?;
        }
        // Symlinks and special files are not carried into a checkout.
    }

    Ok(())
}
