//! Configuration System
//!
//! Layered configuration for the backend, scheduler, pipeline, storage and
//! logging. Sources are merged lowest to highest: built-in defaults, the global
//! user config file, workspace config files, then `SIMMER__*` environment
//! variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

/// Environment variable holding the gateway credential when none is configured.
pub const API_KEY_ENV: &str = "AI_GATEWAY_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimmerConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generation backend (AI gateway) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    /// Bearer credential. Falls back to `AI_GATEWAY_API_KEY` when unset.
    pub api_key: Option<String>,
    pub content_model: String,
    pub image_model: String,
    pub max_tokens: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai-gateway.happycapy.ai/api/v1".to_string(),
            api_key: None,
            content_model: "claude-sonnet-4".to_string(),
            image_model: "google/gemini-3-pro-image-preview".to_string(),
            max_tokens: 4000,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            ));
        }
        if self.content_model.trim().is_empty() {
            return Err("content_model cannot be empty".to_string());
        }
        if self.image_model.trim().is_empty() {
            return Err("image_model cannot be empty".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Job scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on one job's whole pipeline
    pub job_timeout_secs: u64,
    /// Idle gap after each job before the next one starts
    pub pacing_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: 360,
            pacing_delay_ms: 1000,
        }
    }
}

impl SchedulerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}

/// Generation pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_step_images: usize,
    pub step_image_timeout_secs: u64,
    pub step_image_delay_ms: u64,
    pub author_id: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_step_images: 8,
            step_image_timeout_secs: 60,
            step_image_delay_ms: 1000,
            author_id: "ai-chef".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn step_image_timeout(&self) -> Duration {
        Duration::from_secs(self.step_image_timeout_secs)
    }

    pub fn step_image_delay(&self) -> Duration {
        Duration::from_millis(self.step_image_delay_ms)
    }
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Artifact collection file, relative paths resolve against the workspace
    pub artifacts_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifacts_path: PathBuf::from("data/recipes.json"),
        }
    }
}

impl StorageConfig {
    pub fn resolve_artifacts_path(&self, workspace_root: &Path) -> PathBuf {
        if self.artifacts_path.is_absolute() {
            self.artifacts_path.clone()
        } else {
            workspace_root.join(&self.artifacts_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Backend(String),
    Scheduler(String),
    Pipeline(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Backend(msg) => write!(f, "Backend: {}", msg),
            ValidationError::Scheduler(msg) => write!(f, "Scheduler: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SimmerConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.backend.validate() {
            errors.push(ValidationError::Backend(e));
        }

        if self.scheduler.job_timeout_secs == 0 {
            errors.push(ValidationError::Scheduler(
                "job_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.pipeline.step_image_timeout_secs == 0 {
            errors.push(ValidationError::Pipeline(
                "step_image_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.pipeline.author_id.trim().is_empty() {
            errors.push(ValidationError::Pipeline(
                "author_id cannot be empty".to_string(),
            ));
        }

        if self.storage.artifacts_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "artifacts_path cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one `ConfigError`.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(self)
    }

    fn apply_credential_fallback(&mut self) {
        let configured = self
            .backend
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !configured {
            self.backend.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }
    }
}

/// Builds a `SimmerConfig` from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `workspace_root` from every source.
    pub fn load(workspace_root: &Path) -> Result<SimmerConfig, ApiError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(sources::environment());

        let mut config: SimmerConfig = builder.build()?.try_deserialize()?;
        config.apply_credential_fallback();
        Ok(config)
    }

    /// Load from one explicit file, on top of defaults and environment.
    pub fn load_from_file(path: &Path) -> Result<SimmerConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let mut config: SimmerConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path.to_path_buf()).required(true))
            .add_source(sources::environment())
            .build()?
            .try_deserialize()?;
        config.apply_credential_fallback();
        Ok(config)
    }

    /// Location of the user-level config file, when a home directory exists.
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }
}
