//! Remote storage and build registry configuration.

use crate::staging::DigestAlgorithm;

/// Default object storage bucket.
pub const DEFAULT_BUCKET: &str = "tos://pico-cm-artifact";

/// Default build registry endpoint.
pub const DEFAULT_REGISTRY_ENDPOINT: &str = "http://pico-pdm-be.bytedance.net/api/v1/buildEntity";

/// Default manifest repo name.
pub const DEFAULT_REPO: &str = "daily-build";

/// Default registry project.
pub const DEFAULT_PROJECT: &str = "PUI";

/// Where uploaded artifacts go and how they are registered.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Bucket URL, without trailing slash.
    pub bucket: String,

    /// Registry endpoint receiving the manifest.
    pub registry_endpoint: String,

    /// Registry project.
    pub project: String,

    /// Manifest repo name (`pdm_repo`).
    pub repo: String,

    /// Remote destination of the comma-joined link list.
    ///
    /// Default: None (no link list)
    pub link_list_destination: Option<String>,

    /// Hash recorded as each artifact's digest.
    pub digest: DigestAlgorithm,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            registry_endpoint: DEFAULT_REGISTRY_ENDPOINT.to_string(),
            project: DEFAULT_PROJECT.to_string(),
            repo: DEFAULT_REPO.to_string(),
            link_list_destination: None,
            digest: DigestAlgorithm::default(),
        }
    }
}
