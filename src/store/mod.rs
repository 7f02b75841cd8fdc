//! Artifact Store
//!
//! Whole-collection persistence for completed artifacts. The store is read for
//! dedup lookups and rewritten in full when a job finishes; there is no
//! incremental append at this boundary.

pub mod persistence;

pub use persistence::JsonFileArtifactStore;

use crate::artifact::Artifact;
use crate::error::StorageError;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Artifact collection interface
pub trait ArtifactStore: Send + Sync {
    fn load(&self) -> Result<Vec<Artifact>, StorageError>;

    /// Replace the stored collection with `artifacts`.
    fn save(&self, artifacts: &[Artifact]) -> Result<(), StorageError>;
}

/// Process-local store, for embedding and tests.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<Vec<Artifact>>,
    saves: AtomicUsize,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts(artifacts: Vec<Artifact>) -> Self {
        Self {
            artifacts: RwLock::new(artifacts),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of completed `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Artifact> {
        self.artifacts.read().clone()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn load(&self) -> Result<Vec<Artifact>, StorageError> {
        Ok(self.artifacts.read().clone())
    }

    fn save(&self, artifacts: &[Artifact]) -> Result<(), StorageError> {
        *self.artifacts.write() = artifacts.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
