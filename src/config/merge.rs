//! Merge policy for configuration sources.

pub mod merge_policy;
