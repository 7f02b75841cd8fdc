//! Configuration sources layered on top of the merge defaults.

pub mod global_file;
pub mod workspace_file;

use config::Environment;

/// `SIMMER__SECTION__KEY` environment overrides, e.g.
/// `SIMMER__SCHEDULER__JOB_TIMEOUT_SECS=90`.
pub fn environment() -> Environment {
    Environment::with_prefix("SIMMER")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
