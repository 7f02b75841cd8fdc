//! Submission boundary
//!
//! Every request goes through a dedup lookup first. A hit returns the stored
//! artifact without touching the scheduler; a miss is queued on a lane.

use crate::artifact::{Artifact, Language};
use crate::dedup;
use crate::error::ApiError;
use crate::scheduler::{Lane, PendingArtifact, PriorityScheduler, SchedulerStatus};
use crate::store::ArtifactStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one `generate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOutcome {
    pub artifact: Artifact,
    /// True when the artifact came from the store rather than a new job
    pub cached: bool,
}

pub struct GenerationService {
    store: Arc<dyn ArtifactStore>,
    scheduler: Arc<PriorityScheduler>,
}

impl GenerationService {
    pub fn new(store: Arc<dyn ArtifactStore>, scheduler: Arc<PriorityScheduler>) -> Self {
        Self { store, scheduler }
    }

    pub fn scheduler(&self) -> &Arc<PriorityScheduler> {
        &self.scheduler
    }

    pub fn find_existing(
        &self,
        requested_name: &str,
        language: Language,
    ) -> Result<Option<Artifact>, ApiError> {
        dedup::find_existing_in(self.store.as_ref(), requested_name, language)
    }

    /// Return a stored artifact for `requested_name`, or generate one on `lane`.
    pub async fn generate(
        &self,
        requested_name: &str,
        language: Language,
        lane: Lane,
    ) -> Result<GenerateOutcome, ApiError> {
        let requested_name = requested_name.trim();
        if requested_name.is_empty() {
            return Err(ApiError::InvalidRequest("dish name is required".to_string()));
        }

        if let Some(artifact) = self.find_existing(requested_name, language)? {
            info!(
                requested_name,
                language = %language,
                artifact_id = %artifact.id,
                "Returning stored artifact"
            );
            return Ok(GenerateOutcome {
                artifact,
                cached: true,
            });
        }

        let artifact = self
            .scheduler
            .submit(requested_name, language, lane)
            .await?;
        Ok(GenerateOutcome {
            artifact,
            cached: false,
        })
    }

    /// Queue every new name on the bulk lane and return without waiting.
    /// Blank names, names already stored and repeats within the batch are skipped.
    pub fn batch_generate<S: AsRef<str>>(
        &self,
        names: &[S],
        language: Language,
    ) -> Result<Vec<(String, PendingArtifact)>, ApiError> {
        let stored = self.store.load()?;
        let mut seen = HashSet::new();
        let mut queued = Vec::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if let Some(existing) = dedup::find_existing(&stored, name, language) {
                debug!(requested_name = name, artifact_id = %existing.id, "Skipping stored dish");
                continue;
            }
            if !seen.insert(dedup::normalize(name)) {
                continue;
            }
            queued.push((name.to_string(), self.scheduler.submit_bulk(name, language)));
        }

        info!(
            requested = names.len(),
            queued = queued.len(),
            language = %language,
            "Batch queued"
        );
        Ok(queued)
    }

    pub fn status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    pub fn clear_bulk_lane(&self) -> usize {
        self.scheduler.clear_bulk_lane()
    }
}
