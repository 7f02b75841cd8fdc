//! Dedup keys
//!
//! Detects previously completed work before a job is queued. Matching is exact
//! after normalization; there is no fuzzy matching, no invalidation and no TTL.

use crate::artifact::{Artifact, Language};
use crate::error::ApiError;
use crate::store::ArtifactStore;

/// Normalized comparison key: lowercase with every whitespace character removed.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find a stored artifact whose name matches `requested_name`.
///
/// Bilingual records match on either language's name regardless of the
/// requested language. Legacy single-language records match on their single
/// name, but only when they were produced for the requested language.
pub fn find_existing<'a>(
    artifacts: &'a [Artifact],
    requested_name: &str,
    language: Language,
) -> Option<&'a Artifact> {
    let key = normalize(requested_name);
    if key.is_empty() {
        return None;
    }

    artifacts.iter().find(|artifact| {
        let bilingual_hit = [artifact.name_zh.as_deref(), artifact.name_en.as_deref()]
            .into_iter()
            .flatten()
            .any(|name| normalize(name) == key);
        if bilingual_hit {
            return true;
        }

        artifact.is_legacy()
            && artifact.record_language() == language
            && artifact
                .name
                .as_deref()
                .is_some_and(|name| normalize(name) == key)
    })
}

/// Store-backed lookup used by the submission boundary.
pub fn find_existing_in(
    store: &dyn ArtifactStore,
    requested_name: &str,
    language: Language,
) -> Result<Option<Artifact>, ApiError> {
    let artifacts = store.load()?;
    Ok(find_existing(&artifacts, requested_name, language).cloned())
}
