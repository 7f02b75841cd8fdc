//! Simmer: Prioritized Recipe Generation
//!
//! Schedules multi-stage recipe generation jobs (text content, a hero image and
//! per-step images) against a rate-limited AI backend. Interactive requests
//! are served ahead of bulk work, one job runs at a time, and completed
//! recipes are reused instead of regenerated.

pub mod artifact;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod generation;
pub mod logging;
pub mod scheduler;
pub mod service;
pub mod store;

pub use artifact::{Artifact, Language};
pub use error::{ApiError, StorageError};
pub use scheduler::{Lane, PendingArtifact, PriorityScheduler, SchedulerStatus};
pub use service::{GenerateOutcome, GenerationService};
