//! Generation executor: runs the content, hero image and step image stages for
//! one job, then persists the assembled artifact.
//!
//! Stages run strictly in sequence. Content and hero image failures abort the
//! job; step image failures degrade to an empty slot.

use crate::artifact::{Artifact, Language};
use crate::backend::GenerationBackend;
use crate::config::PipelineConfig;
use crate::error::ApiError;
use crate::generation::extract::{parse_content, GeneratedContent};
use crate::generation::{prompt, JobExecutor};
use crate::store::ArtifactStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::sync::Arc;
use tracing::{debug, info, warn};

const AUTHOR_ZH: &str = "AI厨房";
const AUTHOR_EN: &str = "AI Kitchen";

/// Backend-driven [`JobExecutor`].
pub struct GenerationPipeline {
    backend: Arc<dyn GenerationBackend>,
    store: Arc<dyn ArtifactStore>,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        store: Arc<dyn ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    async fn generate_content(
        &self,
        requested_name: &str,
        language: Language,
    ) -> Result<GeneratedContent, ApiError> {
        let response = self
            .backend
            .generate_content(&prompt::content_prompt(requested_name, language))
            .await?;
        let content = parse_content(&response, language)?;

        info!(
            requested_name,
            language = %language,
            steps = content.steps_for(language).len(),
            "Recipe content generated"
        );
        Ok(content)
    }

    /// One entry per step. Steps beyond the cap, and steps whose call failed
    /// or timed out, get `None`.
    async fn generate_step_images(&self, dish_name: &str, steps: &[String]) -> Vec<Option<String>> {
        let attempted = steps.len().min(self.config.max_step_images);
        let mut images = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().take(attempted).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.step_image_delay()).await;
            }

            let prompt = prompt::step_image_prompt(dish_name, index, step);
            let call = self.backend.generate_image(&prompt);
            match tokio::time::timeout(self.config.step_image_timeout(), call).await {
                Ok(Ok(url)) => {
                    debug!(step = index + 1, total = attempted, "Step image generated");
                    images.push(Some(url));
                }
                Ok(Err(e)) => {
                    warn!(step = index + 1, total = attempted, error = %e, "Step image failed");
                    images.push(None);
                }
                Err(_) => {
                    warn!(
                        step = index + 1,
                        total = attempted,
                        timeout_secs = self.config.step_image_timeout_secs,
                        "Step image timed out"
                    );
                    images.push(None);
                }
            }
        }

        images.resize(steps.len(), None);
        images
    }

    fn assemble(
        &self,
        content: GeneratedContent,
        language: Language,
        image_url: String,
        step_images: Vec<Option<String>>,
        created_at: DateTime<Utc>,
    ) -> Artifact {
        Artifact {
            id: created_at.timestamp_millis().to_string(),
            name: None,
            name_zh: Some(content.name_zh).filter(|name| !name.trim().is_empty()),
            name_en: Some(content.name_en).filter(|name| !name.trim().is_empty()),
            description_zh: content.description_zh,
            description_en: content.description_en,
            emoji: content.emoji,
            cook_time: content.cook_time,
            difficulty_zh: content.difficulty_zh,
            difficulty_en: content.difficulty_en,
            servings: content.servings,
            ingredients_zh: content.ingredients_zh,
            ingredients_en: content.ingredients_en,
            steps_zh: content.steps_zh,
            steps_en: content.steps_en,
            tips_zh: content.tips_zh,
            tips_en: content.tips_en,
            image_url: Some(image_url),
            step_images,
            author_zh: Some(AUTHOR_ZH.to_string()),
            author_en: Some(AUTHOR_EN.to_string()),
            author_id: Some(self.config.author_id.clone()),
            created_at: Some(created_at),
            likes: 0,
            views: 0,
            language: Some(language),
            extra: Map::new(),
        }
    }

    /// Append to the stored collection and write it back whole.
    fn persist(&self, artifact: &Artifact) -> Result<(), ApiError> {
        let mut artifacts = self.store.load()?;
        artifacts.push(artifact.clone());
        self.store.save(&artifacts)?;

        info!(
            artifact_id = %artifact.id,
            total_artifacts = artifacts.len(),
            "Artifact persisted"
        );
        Ok(())
    }
}

#[async_trait]
impl JobExecutor for GenerationPipeline {
    async fn run(&self, requested_name: &str, language: Language) -> Result<Artifact, ApiError> {
        let content = self.generate_content(requested_name, language).await?;
        let dish_name = content.name_for(language).to_string();

        let image_url = self
            .backend
            .generate_image(&prompt::hero_image_prompt(&dish_name, language))
            .await?;
        info!(dish_name = %dish_name, "Hero image generated");

        let step_images = self
            .generate_step_images(&dish_name, content.steps_for(language))
            .await;

        let artifact = self.assemble(content, language, image_url, step_images, Utc::now());
        self.persist(&artifact)?;
        Ok(artifact)
    }
}
