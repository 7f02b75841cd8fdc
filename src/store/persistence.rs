//! JSON file persistence for the artifact collection

use crate::artifact::Artifact;
use crate::error::StorageError;
use crate::store::ArtifactStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores the whole collection as one pretty-printed JSON array.
pub struct JsonFileArtifactStore {
    path: PathBuf,
}

impl JsonFileArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "artifacts.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ArtifactStore for JsonFileArtifactStore {
    /// A missing file is an empty collection. A file that exists but does not
    /// parse is an error, so a later save can never overwrite it with nothing.
    fn load(&self) -> Result<Vec<Artifact>, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, artifacts: &[Artifact]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(artifacts)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Write then rename so readers never observe a half-written collection.
        let temp_path = self.temp_path();
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(
            path = %self.path.display(),
            artifact_count = artifacts.len(),
            "Artifact collection saved"
        );
        Ok(())
    }
}
