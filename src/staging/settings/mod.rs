//! Configuration structures for a staging run.
//!
//! Everything a run needs is folded into one immutable [`BuildContext`],
//! constructed once through [`BuildContextBuilder`] and passed by reference
//! to every stage.

mod builder;
mod context;
mod package;
mod publish;
mod signing;
mod tools;

pub use builder::{BuildContextBuilder, DEFAULT_OUTPUT_KINDS, DEFAULT_OUTPUT_ROOT, RESERVED_KEY_IDS};
pub use context::{BUILD_LOG_FILE, BuildContext, PACKAGE_EXTENSION};
pub use package::{ProductSettings, method_key};
pub use publish::{
    DEFAULT_BUCKET, DEFAULT_PROJECT, DEFAULT_REGISTRY_ENDPOINT, DEFAULT_REPO, PublishSettings,
};
pub use signing::{DEFAULT_KEY_ROOT, DEFAULT_KEY_TYPE, KeyPair, SigningSettings};
pub use tools::ToolPaths;

/// Splits a comma separated list, trimming entries and dropping empty ones.
///
/// Order is preserved; it decides which kind/channel pair wins when renaming.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
