//! Product and provenance metadata.

/// Product identity and provenance of the build being staged.
///
/// # Examples
///
/// ```no_run
/// use apk_release_stager::staging::ProductSettings;
///
/// let product = ProductSettings {
///     product_name: "Launcher".into(),
///     method: "ProjectBuild.BuildForAndroid".into(),
///     version: Some("1.3.1".into()),
///     version_code: Some("100301001".into()),
///     commit_id: "3331330".into(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProductSettings {
    /// Product name, also the stem of the raw package.
    pub product_name: String,

    /// Fully qualified build entry method, e.g. `ProjectBuild.BuildForAndroid`.
    pub method: String,

    /// Marketing version (`versionname`).
    ///
    /// Default: None
    pub version: Option<String>,

    /// Bundle version code (`versioncode`).
    ///
    /// Default: None
    pub version_code: Option<String>,

    /// Source commit the build was made from.
    pub commit_id: String,

    /// CI build tag.
    pub build_tag: String,

    /// Build revision, scopes the remote object prefix.
    pub build_revision: String,

    /// Source branch, required by the registry manifest.
    pub branch: String,
}

/// Extracts the method key, the second dot-separated segment of `method`.
///
/// Returns `None` when there is no second segment or it is empty.
pub fn method_key(method: &str) -> Option<&str> {
    method.split('.').nth(1).filter(|key| !key.is_empty())
}
