//! Generation pipeline
//!
//! Turns one requested dish name into a finished [`Artifact`]: text content,
//! then a hero image, then one image per step.

pub mod executor;
pub mod extract;
pub mod prompt;

pub use executor::GenerationPipeline;
pub use extract::{extract_json_payload, parse_content, GeneratedContent};

use crate::artifact::{Artifact, Language};
use crate::error::ApiError;
use async_trait::async_trait;

/// Runs the whole pipeline for one job. The scheduler holds one of these and
/// never looks inside it.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn run(&self, requested_name: &str, language: Language) -> Result<Artifact, ApiError>;
}
