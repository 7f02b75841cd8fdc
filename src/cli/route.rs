//! CLI route: single route table and run context. Dispatches to the
//! generation service and presentation.

use crate::artifact::Language;
use crate::backend::{GatewayBackend, GenerationBackend};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_batch_summary, format_generate_json, format_generate_text, format_list_json,
    format_list_text, BatchRow,
};
use crate::config::SimmerConfig;
use crate::error::ApiError;
use crate::generation::GenerationPipeline;
use crate::scheduler::{Lane, PriorityScheduler};
use crate::service::GenerationService;
use crate::store::{ArtifactStore, JsonFileArtifactStore};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Runtime context for CLI execution: store, scheduler and service built from
/// one loaded configuration. Must be created inside a tokio runtime.
pub struct RunContext {
    workspace_root: PathBuf,
    store: Arc<dyn ArtifactStore>,
    service: GenerationService,
}

impl RunContext {
    /// Build the context with the configured gateway backend.
    pub fn new(workspace_root: PathBuf, config: SimmerConfig) -> Result<Self, ApiError> {
        let backend = GatewayBackend::new(&config.backend)?;
        if !backend.has_credential() {
            warn!("No backend credential configured; generation requests will fail");
        }
        Self::with_backend(workspace_root, config, Arc::new(backend))
    }

    /// Build the context around any backend.
    pub fn with_backend(
        workspace_root: PathBuf,
        config: SimmerConfig,
        backend: Arc<dyn GenerationBackend>,
    ) -> Result<Self, ApiError> {
        let config = config.validated()?;

        let artifacts_path = config.storage.resolve_artifacts_path(&workspace_root);
        let store: Arc<dyn ArtifactStore> = Arc::new(JsonFileArtifactStore::new(&artifacts_path));

        let pipeline = GenerationPipeline::new(backend, Arc::clone(&store), config.pipeline.clone());
        let scheduler = PriorityScheduler::spawn(Arc::new(pipeline), config.scheduler.clone())?;
        let service = GenerationService::new(Arc::clone(&store), Arc::new(scheduler));

        info!(
            workspace_root = %workspace_root.display(),
            artifacts_path = %artifacts_path.display(),
            "Run context initialized"
        );
        Ok(Self {
            workspace_root,
            store,
            service,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn service(&self) -> &GenerationService {
        &self.service
    }

    /// Run one command and return its rendered output.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                name,
                lang,
                bulk,
                format,
            } => self.handle_generate(name, *lang, *bulk, format).await,
            Commands::Batch { names, file, lang } => {
                self.handle_batch(names, file.as_deref(), *lang).await
            }
            Commands::List { lang, format } => self.handle_list(*lang, format),
        }
    }

    /// Stop the scheduler worker. Queued jobs are rejected.
    pub async fn shutdown(&self) {
        self.service.scheduler().shutdown().await;
    }

    async fn handle_generate(
        &self,
        name: &str,
        language: Language,
        bulk: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let lane = if bulk { Lane::Bulk } else { Lane::Interactive };
        let outcome = self.service.generate(name, language, lane).await?;

        match format {
            "json" => format_generate_json(&outcome.artifact, outcome.cached),
            _ => Ok(format_generate_text(
                &outcome.artifact,
                outcome.cached,
                language,
            )),
        }
    }

    async fn handle_batch(
        &self,
        names: &[String],
        file: Option<&Path>,
        language: Language,
    ) -> Result<String, ApiError> {
        let mut requested: Vec<String> = names.to_vec();
        if let Some(path) = file {
            requested.extend(read_names_file(path)?);
        }
        requested.retain(|name| !name.trim().is_empty());
        if requested.is_empty() {
            return Err(ApiError::InvalidRequest(
                "no dish names given (pass names or --file)".to_string(),
            ));
        }

        let queued = self.service.batch_generate(&requested, language)?;
        let (queued_names, pending): (Vec<String>, Vec<_>) = queued.into_iter().unzip();
        let results = join_all(pending).await;

        let mut rows: Vec<BatchRow> = queued_names
            .into_iter()
            .zip(results)
            .map(|(name, result)| match result {
                Ok(artifact) => BatchRow::Generated {
                    name,
                    artifact_id: artifact.id,
                },
                Err(e) => BatchRow::Failed {
                    name,
                    error: e.to_string(),
                },
            })
            .collect();

        let handled: Vec<String> = rows
            .iter()
            .filter_map(|row| match row {
                BatchRow::Generated { name, .. } | BatchRow::Failed { name, .. } => {
                    Some(crate::dedup::normalize(name))
                }
                BatchRow::Skipped { .. } => None,
            })
            .collect();
        for name in &requested {
            let key = crate::dedup::normalize(name);
            if !handled.contains(&key) {
                rows.push(BatchRow::Skipped {
                    name: name.trim().to_string(),
                });
            }
        }

        Ok(format_batch_summary(&rows, &self.service.status()))
    }

    fn handle_list(&self, language: Language, format: &str) -> Result<String, ApiError> {
        let artifacts = self.store.load()?;
        match format {
            "json" => format_list_json(&artifacts),
            _ => Ok(format_list_text(&artifacts, language)),
        }
    }
}

/// Dish names from a text file: one per line, blank lines and `#` comments skipped.
fn read_names_file(path: &Path) -> Result<Vec<String>, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ApiError::InvalidRequest(format!("Failed to read names file {}: {}", path.display(), e))
    })?;
    Ok(parse_names(&text))
}

fn parse_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
