use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use uuid::Uuid;

use crate::types::Serialization;
use crate::ExecutionError;

const REMOVE_ATTEMPTS: u32 = 3;
const REMOVE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Isolated directory owned by a single execution.
///
/// The directory is removed when the workspace is dropped unless it was
/// marked as retained, so teardown also happens on early returns,
/// cancellation and panics.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    dir: PathBuf,
    mapping_file: PathBuf,
    retain: bool,
}

impl Workspace {
    /// Create a uniquely named directory under `root` and materialize the
    /// mapping and every source inside it.
    pub async fn create(
        root: &Path,
        mapping: &str,
        mapping_extension: &str,
        sources: &BTreeMap<String, String>,
    ) -> Result<Self, ExecutionError> {
        fs::create_dir_all(root)
            .await
            .map_err(|e| ExecutionError::filesystem(root, e))?;
        // the engine runs inside the workspace, so every path handed to it is absolute
        let root = std::path::absolute(root).map_err(|e| ExecutionError::filesystem(root, e))?;

        let id = Uuid::new_v4().simple().to_string();
        let dir = root.join(&id);
        // create_dir (not create_dir_all) so an existing directory is an error
        fs::create_dir(&dir)
            .await
            .map_err(|e| ExecutionError::filesystem(&dir, e))?;

        let workspace = Self {
            mapping_file: dir.join(format!("mapping.{}", mapping_extension)),
            id,
            dir,
            retain: false,
        };
        tracing::debug!("Created workspace {}", workspace.dir.display());

        write_file(&workspace.mapping_file, mapping).await?;
        for (name, content) in sources {
            write_file(&workspace.dir.join(name), content).await?;
        }

        Ok(workspace)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mapping_file(&self) -> &Path {
        &self.mapping_file
    }

    pub fn output_file(&self, serialization: Serialization) -> PathBuf {
        self.dir
            .join(format!("output.{}", serialization.extension()))
    }

    pub fn metadata_file(&self, serialization: Serialization) -> PathBuf {
        self.dir
            .join(format!("metadata.{}", serialization.extension()))
    }

    /// Keep the directory on disk after the workspace is dropped.
    pub fn retain(&mut self) {
        self.retain = true;
    }

    pub fn is_retained(&self) -> bool {
        self.retain
    }

    /// Recursively remove the directory. Removing an already removed
    /// workspace succeeds.
    ///
    /// A killed engine can still create files for a moment after the kill
    /// was sent, so a failed removal is retried a few times.
    pub fn destroy(&self) -> Result<(), ExecutionError> {
        let mut attempt = 1;
        loop {
            match std::fs::remove_dir_all(&self.dir) {
                Ok(()) => {
                    tracing::debug!("Removed workspace {}", self.dir.display());
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt < REMOVE_ATTEMPTS => {
                    tracing::debug!(
                        "Removing workspace {} failed ({}), retrying",
                        self.dir.display(),
                        e
                    );
                    attempt += 1;
                    std::thread::sleep(REMOVE_RETRY_DELAY);
                }
                Err(e) => return Err(ExecutionError::filesystem(&self.dir, e)),
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.is_retained() {
            tracing::warn!("Retaining workspace {}", self.dir.display());
            return;
        }
        if let Err(e) = self.destroy() {
            tracing::warn!("Failed to remove workspace: {}", e);
        }
    }
}

async fn write_file(path: &Path, content: &str) -> Result<(), ExecutionError> {
    fs::write(path, content)
        .await
        .map_err(|e| ExecutionError::filesystem(path, e))
}
