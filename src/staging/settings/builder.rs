//! Builder for constructing a [`BuildContext`].

use super::{
    BuildContext, ProductSettings, PublishSettings, SigningSettings, ToolPaths, method_key,
};
use crate::staging::error::{Context, Error, ErrorExt, Result};
use chrono::{DateTime, Local};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Output root used when none is configured, relative to the project root.
pub const DEFAULT_OUTPUT_ROOT: &str = "build/dist/";

/// Kind tags used when none are configured.
pub const DEFAULT_OUTPUT_KINDS: [&str; 2] = ["release", "debug"];

/// Output directories the stages own; no key directory may shadow them.
pub const RESERVED_KEY_IDS: [&str; 3] = ["origin", "app", "archive"];

/// Builder for [`BuildContext`].
///
/// # Examples
///
/// ```no_run
/// use apk_release_stager::staging::{BuildContextBuilder, ProductSettings, ToolPaths};
///
/// # fn example() -> apk_release_stager::staging::Result<()> {
/// let context = BuildContextBuilder::new()
///     .product(ProductSettings {
///         product_name: "Launcher".into(),
///         method: "ProjectBuild.BuildForAndroid".into(),
///         ..Default::default()
///     })
///     .project_root("/work/launcher")
///     .tools(ToolPaths::with_home("/opt/unity/Editor/Unity".into(), "/home/ci".as_ref()))
///     .output_channels(vec!["cn".into(), "global".into()])
///     .build()?;
/// assert!(context.output_root().ends_with("build/dist/BuildForAndroid"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct BuildContextBuilder {
    product: Option<ProductSettings>,
    project_root: Option<PathBuf>,
    output_root: Option<PathBuf>,
    signing: SigningSettings,
    publish: PublishSettings,
    tools: Option<ToolPaths>,
    output_kinds: Option<Vec<String>>,
    output_channels: Vec<String>,
    archive_outputs: bool,
    started_at: Option<DateTime<Local>>,
}

impl BuildContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets product and provenance metadata.
    ///
    /// # Required
    pub fn product(mut self, product: ProductSettings) -> Self {
        self.product = Some(product);
        self
    }

    /// Sets the Unity project root.
    ///
    /// Default: current directory
    pub fn project_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the base output directory. Relative paths resolve against the
    /// project root; the method key is appended on build.
    ///
    /// Default: [`DEFAULT_OUTPUT_ROOT`]
    pub fn output_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets signing configuration.
    pub fn signing(mut self, signing: SigningSettings) -> Self {
        self.signing = signing;
        self
    }

    /// Sets upload and registry configuration.
    pub fn publish(mut self, publish: PublishSettings) -> Self {
        self.publish = publish;
        self
    }

    /// Sets external tool locations.
    ///
    /// # Required
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Sets kind tags. Order matters: earlier kinds win.
    ///
    /// Default: [`DEFAULT_OUTPUT_KINDS`]
    pub fn output_kinds(mut self, kinds: Vec<String>) -> Self {
        self.output_kinds = Some(kinds);
        self
    }

    /// Sets channel tags. Order matters: earlier channels win.
    ///
    /// Default: empty, so no package is renamed
    pub fn output_channels(mut self, channels: Vec<String>) -> Self {
        self.output_channels = channels;
        self
    }

    /// Enables zipping the signed outputs.
    pub fn archive_outputs(mut self, enabled: bool) -> Self {
        self.archive_outputs = enabled;
        self
    }

    /// Pins the run timestamp.
    ///
    /// Default: now
    pub fn started_at(mut self, at: DateTime<Local>) -> Self {
        self.started_at = Some(at);
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// - `product` or `tools` not set
    /// - empty product name or build tool
    /// - method without a usable key segment
    pub fn build(self) -> Result<BuildContext> {
        let product = self.product.context("product settings are required")?;
        let tools = self.tools.context("tool paths are required")?;

        if product.product_name.trim().is_empty() {
            return Err(Error::Config("product name is empty".into()));
        }
        if tools.build_tool.as_os_str().is_empty() {
            return Err(Error::Config("build tool path is empty".into()));
        }
        let key = method_key(&product.method)
            .ok_or_else(|| {
                Error::Config(format!(
                    "method `{}` has no key segment (expected Class.Method)",
                    product.method
                ))
            })?
            .to_string();

        let project_root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir().fs_context("reading current directory", ".")?,
        };
        let project_root = project_root
            .absolutize()
            .fs_context("resolving project root", &project_root)?
            .into_owned();

        let output_base = self
            .output_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT));
        let output_root = project_root.join(output_base).join(&key);
        let output_root = output_root
            .absolutize()
            .fs_context("resolving output root", &output_root)?
            .into_owned();

        let output_kinds = self
            .output_kinds
            .unwrap_or_else(|| DEFAULT_OUTPUT_KINDS.iter().map(|s| s.to_string()).collect());

        let mut signing = self.signing;
        signing.key_ids.retain(|id| !id.trim().is_empty());
        if let Some(id) = signing
            .key_ids
            .iter()
            .find(|id| RESERVED_KEY_IDS.contains(&id.as_str()))
        {
            return Err(Error::Config(format!(
                "signing key `{id}` would sign into the `{id}` staging directory"
            )));
        }

        Ok(BuildContext::new(
            product,
            key,
            project_root,
            output_root,
            signing,
            self.publish,
            tools,
            non_empty(output_kinds),
            non_empty(self.output_channels),
            self.archive_outputs,
            self.started_at.unwrap_or_else(Local::now),
        ))
    }
}

fn non_empty(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn product() -> ProductSettings {
        ProductSettings {
            product_name: "Launcher".into(),
            method: "ProjectBuild.BuildForAndroid".into(),
            version: Some("1.3.1".into()),
            commit_id: "abc123".into(),
            ..Default::default()
        }
    }

    fn tools() -> ToolPaths {
        ToolPaths::with_home(PathBuf::from("/opt/unity"), Path::new("/home/ci"))
    }

    #[test]
    fn output_root_is_scoped_by_method_key() {
        let ctx = BuildContextBuilder::new()
            .product(product())
            .project_root("/work/launcher")
            .tools(tools())
            .build()
            .unwrap();
        assert_eq!(
            ctx.output_root(),
            Path::new("/work/launcher/build/dist/BuildForAndroid")
        );
        assert_eq!(
            ctx.raw_package_path(),
            Path::new("/work/launcher/build/dist/BuildForAndroid/origin/Launcher.apk")
        );
        assert_eq!(ctx.output_kinds(), ["release", "debug"]);
    }

    #[test]
    fn absolute_output_root_is_kept() {
        let ctx = BuildContextBuilder::new()
            .product(product())
            .project_root("/work/launcher")
            .output_root("/srv/out")
            .tools(tools())
            .build()
            .unwrap();
        assert_eq!(ctx.output_root(), Path::new("/srv/out/BuildForAndroid"));
    }

    #[test]
    fn rejects_method_without_key() {
        let err = BuildContextBuilder::new()
            .product(ProductSettings {
                method: "ProjectBuild".into(),
                ..product()
            })
            .project_root("/work")
            .tools(tools())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_empty_product_name() {
        let err = BuildContextBuilder::new()
            .product(ProductSettings {
                product_name: " ".into(),
                ..product()
            })
            .project_root("/work")
            .tools(tools())
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn canonical_name_encodes_provenance() {
        let at = Local.with_ymd_and_hms(2024, 5, 7, 23, 7, 0).unwrap();
        let ctx = BuildContextBuilder::new()
            .product(product())
            .project_root("/work")
            .tools(tools())
            .started_at(at)
            .build()
            .unwrap();
        assert_eq!(
            ctx.canonical_name("cn", "debug"),
            "Launcher_BuildForAndroid_abc123_1.3.1_20240507230700_cn-debug"
        );
        assert_eq!(ctx.build_time(), "2024-05-07 23:07:00");
    }

    #[test]
    fn empty_signing_keys_are_dropped() {
        let ctx = BuildContextBuilder::new()
            .product(product())
            .project_root("/work")
            .tools(tools())
            .signing(SigningSettings {
                key_ids: vec!["keyA".into(), "".into(), "keyB".into()],
                ..Default::default()
            })
            .build()
            .unwrap();
        assert_eq!(ctx.signing().key_ids, ["keyA", "keyB"]);
    }

    #[test]
    fn rejects_key_ids_shadowing_staging_dirs() {
        for reserved in RESERVED_KEY_IDS {
            let err = BuildContextBuilder::new()
                .product(product())
                .project_root("/work")
                .tools(tools())
                .signing(SigningSettings {
                    key_ids: vec!["keyA".into(), reserved.into()],
                    ..Default::default()
                })
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::Config(ref m) if m.contains(reserved)), "{err}");
        }
    }
}
