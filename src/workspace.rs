//! Ephemeral per-submission directories.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One submission's directory under the build root.
///
/// Call [`Workspace::destroy`] when done. A workspace dropped without it
/// (cancelled request, panic) is removed synchronously in `Drop`.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    root: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `build_root`.
    pub async fn create(build_root: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(build_root)
            .await
            .map_err(create_err(build_root))?;
        // Compile commands run with the workspace as cwd, so paths handed to
        // them must not be relative.
        let build_root = tokio::fs::canonicalize(build_root)
            .await
            .map_err(create_err(build_root))?;

        let id = uuid::Uuid::new_v4().to_string();
        let root = build_root.join(&id);
        // create_dir, not create_dir_all: an existing directory is an error.
        tokio::fs::create_dir(&root)
            .await
            .map_err(create_err(&root))?;

        debug!(workspace = %id, root = ?root, "Workspace created");
        Ok(Self {
            id,
            root,
            removed: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Write a text file into the workspace root.
    pub async fn write(&self, name: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.root.join(name), content)
            .await
            .map_err(|source| Error::WorkspaceWrite {
                name: name.to_string(),
                source,
            })
    }

    /// Recursively remove the workspace. Never fails; errors are logged.
    ///
    /// If the returned future is dropped before removal finishes, `Drop`
    /// still removes the directory.
    pub async fn destroy(mut self) {
        let result = tokio::fs::remove_dir_all(&self.root).await;
        self.removed = true;
        match result {
            Ok(()) => debug!(workspace = %self.id, "Workspace removed"),
            Err(e) => warn!(workspace = %self.id, error = %e, "Failed to remove workspace"),
        }
    }
}

fn create_err(path: &Path) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.to_path_buf();
    move |source| Error::WorkspaceCreate { path, source }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            warn!(workspace = %self.id, error = %e, "Failed to remove abandoned workspace");
        }
    }
}
