//! The [`BuildContext`] structure and its accessors.

use super::{ProductSettings, PublishSettings, SigningSettings, ToolPaths};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Name of the log file handed to the build tool.
pub const BUILD_LOG_FILE: &str = "build.log";

/// Package file extension.
pub const PACKAGE_EXTENSION: &str = "apk";

/// Immutable configuration of one staging run.
///
/// Created once at start through [`BuildContextBuilder`](super::BuildContextBuilder)
/// and never mutated afterwards. Stages only read from it.
///
/// # Staging layout
///
/// ```text
/// <output_root>/origin/     raw and renamed packages, symbol files
/// <output_root>/app/        aligned, unsigned packages
/// <output_root>/<key id>/   signed packages, one directory per key
/// ```
#[derive(Clone, Debug)]
pub struct BuildContext {
    product: ProductSettings,
    method_key: String,
    project_root: PathBuf,
    output_root: PathBuf,
    signing: SigningSettings,
    publish: PublishSettings,
    tools: ToolPaths,
    output_kinds: Vec<String>,
    output_channels: Vec<String>,
    archive_outputs: bool,
    started_at: DateTime<Local>,
}

impl BuildContext {
    /// Returns the product name.
    pub fn product_name(&self) -> &str {
        &self.product.product_name
    }

    /// Returns the fully qualified build entry method.
    pub fn method(&self) -> &str {
        &self.product.method
    }

    /// Returns the method key (second segment of the method).
    pub fn method_key(&self) -> &str {
        &self.method_key
    }

    /// Returns the product and provenance metadata.
    pub fn product(&self) -> &ProductSettings {
        &self.product
    }

    /// Returns the version, if configured.
    pub fn version(&self) -> Option<&str> {
        self.product.version.as_deref()
    }

    /// Returns the version or `unversioned`, as used in file names.
    pub fn version_label(&self) -> &str {
        self.version().unwrap_or("unversioned")
    }

    /// Returns the bundle version code, if configured.
    pub fn version_code(&self) -> Option<&str> {
        self.product.version_code.as_deref()
    }

    /// Returns the Unity project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Returns the method-scoped output root.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Directory receiving the raw build output.
    pub fn origin_dir(&self) -> PathBuf {
        self.output_root.join("origin")
    }

    /// Directory receiving aligned packages.
    pub fn app_dir(&self) -> PathBuf {
        self.output_root.join("app")
    }

    /// Directory receiving packages signed with `key_id`.
    pub fn key_dir(&self, key_id: &str) -> PathBuf {
        self.output_root.join(key_id)
    }

    /// Directory receiving the optional output archive.
    pub fn archive_dir(&self) -> PathBuf {
        self.output_root.join("archive")
    }

    /// Path the build tool writes the raw package to.
    pub fn raw_package_path(&self) -> PathBuf {
        self.origin_dir()
            .join(format!("{}.{}", self.product_name(), PACKAGE_EXTENSION))
    }

    /// Unity's persisted project settings.
    pub fn project_settings_file(&self) -> PathBuf {
        self.project_root
            .join("ProjectSettings")
            .join("ProjectSettings.asset")
    }

    /// Local path of the link list written before upload.
    pub fn link_list_file(&self) -> PathBuf {
        self.project_root.join("toslinks.txt")
    }

    /// Returns the signing configuration.
    pub fn signing(&self) -> &SigningSettings {
        &self.signing
    }

    /// Returns the upload and registry configuration.
    pub fn publish(&self) -> &PublishSettings {
        &self.publish
    }

    /// Returns the external tool locations.
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Kind tags (release, debug, ...) in configured order.
    pub fn output_kinds(&self) -> &[String] {
        &self.output_kinds
    }

    /// Channel tags (cn, global, ...) in configured order.
    pub fn output_channels(&self) -> &[String] {
        &self.output_channels
    }

    /// Whether signed outputs are additionally zipped.
    pub fn archive_outputs(&self) -> bool {
        self.archive_outputs
    }

    /// Moment the run started.
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Timestamp embedded in canonical names, `%Y%m%d%H%M%S`.
    pub fn name_timestamp(&self) -> String {
        self.started_at.format("%Y%m%d%H%M%S").to_string()
    }

    /// Build time reported to the registry, `%Y-%m-%d %H:%M:%S`.
    pub fn build_time(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Canonical package name for a (channel, kind) match, without extension:
    /// `{product}_{method}_{commit}_{version}_{timestamp}_{channel}-{kind}`.
    pub fn canonical_name(&self, channel: &str, kind: &str) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}-{}",
            self.product_name(),
            self.method_key,
            self.product.commit_id,
            self.version_label(),
            self.name_timestamp(),
            channel,
            kind
        )
    }

    /// Creates a new context (used by the builder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        product: ProductSettings,
        method_key: String,
        project_root: PathBuf,
        output_root: PathBuf,
        signing: SigningSettings,
        publish: PublishSettings,
        tools: ToolPaths,
        output_kinds: Vec<String>,
        output_channels: Vec<String>,
        archive_outputs: bool,
        started_at: DateTime<Local>,
    ) -> Self {
        Self {
            product,
            method_key,
            project_root,
            output_root,
            signing,
            publish,
            tools,
            output_kinds,
            output_channels,
            archive_outputs,
            started_at,
        }
    }
}
