//! CLI presentation: text and JSON rendering of service results.

use crate::artifact::{Artifact, Language};
use crate::error::ApiError;
use crate::scheduler::SchedulerStatus;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn to_json_string(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to render JSON: {}", e)))
}

fn step_coverage(artifact: &Artifact, language: Language) -> String {
    format!(
        "{}/{}",
        artifact.illustrated_steps(),
        artifact.steps_for(language).len().max(artifact.step_images.len())
    )
}

/// One generated or cached artifact.
pub fn format_generate_text(artifact: &Artifact, cached: bool, language: Language) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Recipe")));

    let source = if cached {
        "stored (no generation needed)".yellow().to_string()
    } else {
        "generated".green().to_string()
    };
    let title = match artifact.emoji.as_str() {
        "" => artifact.display_name(language).to_string(),
        emoji => format!("{} {}", emoji, artifact.display_name(language)),
    };

    out.push_str(&format!("  Name:        {}\n", title));
    out.push_str(&format!("  ID:          {}\n", artifact.id));
    out.push_str(&format!("  Source:      {}\n", source));
    out.push_str(&format!(
        "  Hero image:  {}\n",
        artifact.image_url.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!(
        "  Step images: {}\n",
        step_coverage(artifact, language)
    ));
    out
}

pub fn format_generate_json(artifact: &Artifact, cached: bool) -> Result<String, ApiError> {
    to_json_string(&json!({ "cached": cached, "artifact": artifact }))
}

/// Outcome of one name in a batch.
pub enum BatchRow {
    Generated { name: String, artifact_id: String },
    Skipped { name: String },
    Failed { name: String, error: String },
}

pub fn format_batch_summary(rows: &[BatchRow], status: &SchedulerStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Batch")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Dish", "Result", "Detail"]);
    let (mut generated, mut skipped, mut failed) = (0, 0, 0);
    for row in rows {
        match row {
            BatchRow::Generated { name, artifact_id } => {
                generated += 1;
                table.add_row(vec![name.as_str(), "generated", artifact_id.as_str()]);
            }
            BatchRow::Skipped { name } => {
                skipped += 1;
                table.add_row(vec![name.as_str(), "skipped", "already stored"]);
            }
            BatchRow::Failed { name, error } => {
                failed += 1;
                table.add_row(vec![name.as_str(), "failed", error.as_str()]);
            }
        }
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!(
        "  {} generated, {} skipped, {} failed\n\n",
        generated.green(),
        skipped.yellow(),
        failed.red()
    ));
    out.push_str(&format_status_text(status));
    out
}

pub fn format_status_text(status: &SchedulerStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Scheduler")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);
    let current = status
        .current_job
        .as_ref()
        .map(|job| format!("{} ({}, {})", job.requested_name, job.lane, job.language))
        .unwrap_or_else(|| "-".to_string());
    let rows = [
        ("Interactive queued", status.interactive_depth.to_string()),
        ("Bulk queued", status.bulk_depth.to_string()),
        ("Running", (if status.is_running { "yes" } else { "no" }).to_string()),
        ("Current job", current),
        (
            "Interactive completed",
            status.stats.interactive_completed.to_string(),
        ),
        ("Bulk completed", status.stats.bulk_completed.to_string()),
        ("Failed", status.stats.failed.to_string()),
        (
            "Total run time",
            format!("{:.1}s", status.stats.cumulative_run_ms as f64 / 1000.0),
        ),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_list_text(artifacts: &[Artifact], language: Language) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Recipes")));
    if artifacts.is_empty() {
        out.push_str("No recipes stored.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["ID", "Name", "Lang", "Step images", "Created"]);
    for artifact in artifacts {
        let created = artifact
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            artifact.id.clone(),
            artifact.display_name(language).to_string(),
            artifact.record_language().to_string(),
            step_coverage(artifact, artifact.record_language()),
            created,
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out.push_str(&format!("\n  {} recipes\n", artifacts.len()));
    out
}

pub fn format_list_json(artifacts: &[Artifact]) -> Result<String, ApiError> {
    to_json_string(&json!({ "total": artifacts.len(), "recipes": artifacts }))
}
