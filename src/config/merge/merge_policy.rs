//! Merge rules: defaults first, later sources override earlier ones key by key.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with every documented key defaulted.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("backend.base_url", "https://ai-gateway.happycapy.ai/api/v1")?
        .set_default("backend.content_model", "claude-sonnet-4")?
        .set_default("backend.image_model", "google/gemini-3-pro-image-preview")?
        .set_default("backend.max_tokens", 4000_i64)?
        .set_default("backend.connect_timeout_secs", 10_i64)?
        .set_default("backend.request_timeout_secs", 120_i64)?
        .set_default("scheduler.job_timeout_secs", 360_i64)?
        .set_default("scheduler.pacing_delay_ms", 1000_i64)?
        .set_default("pipeline.max_step_images", 8_i64)?
        .set_default("pipeline.step_image_timeout_secs", 60_i64)?
        .set_default("pipeline.step_image_delay_ms", 1000_i64)?
        .set_default("pipeline.author_id", "ai-chef")?
        .set_default("storage.artifacts_path", "data/recipes.json")
}
