//! Command line argument parsing and validation.
//!
//! The three positionals come from the CI job; everything else is read from
//! the environment the job exports, with flags available for local runs.

use crate::staging::{
    BuildContext, BuildContextBuilder, DigestAlgorithm, ProductSettings, PublishSettings,
    SigningSettings, ToolPaths, method_key,
    settings::{
        DEFAULT_BUCKET, DEFAULT_KEY_ROOT, DEFAULT_KEY_TYPE, DEFAULT_OUTPUT_ROOT, DEFAULT_PROJECT,
        DEFAULT_REGISTRY_ENDPOINT, DEFAULT_REPO,
    },
    split_list,
};
use anyhow::Context as _;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Stages a Unity Android build into aligned, signed and uploaded artifacts
#[derive(Parser, Debug)]
#[command(
    name = "apk_release_stager",
    version,
    about = "Stages a Unity Android build into aligned, signed and uploaded artifacts",
    long_about = "Builds an Android package with the Unity editor, renames the outputs to canonical
release names, aligns and signs them, uploads everything to object storage and
registers the build.

Usage:
  apk_release_stager /opt/Unity/Editor/Unity Launcher ProjectBuild.BuildForAndroid

Most settings come from the environment (versionname, versioncode,
APK_SIGN_KEYS, GIT_BRANCH_NAME, ...); see --help for the full list.

Exit code 0 = every fatal stage succeeded. Any error exits with 2."
)]
pub struct Args {
    /// Unity editor executable
    #[arg(value_name = "BUILD_TOOL")]
    pub build_tool: PathBuf,

    /// Product name, also the stem of the raw package
    #[arg(value_name = "PRODUCT")]
    pub product: String,

    /// Build entry method, e.g. ProjectBuild.BuildForAndroid
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Marketing version passed to the build and used in file names
    #[arg(long = "version-name", env = "versionname", value_name = "VERSION")]
    pub version_name: Option<String>,

    /// Bundle version code written into the project settings
    #[arg(long, env = "versioncode", value_name = "CODE")]
    pub version_code: Option<String>,

    /// Source commit of the build
    #[arg(long, env = "last_u3d_commit", default_value = "unknown")]
    pub commit: String,

    /// Build tag recorded in the registry
    #[arg(long, env = "buildTag", default_value = "")]
    pub build_tag: String,

    /// Build revision, scopes the remote object keys
    #[arg(long, env = "buildRevision", default_value = "")]
    pub build_revision: String,

    /// Source branch, required to register the build
    #[arg(long, env = "GIT_BRANCH_NAME", default_value = "")]
    pub branch: String,

    /// Comma separated signing key identities
    #[arg(long, env = "APK_SIGN_KEYS", default_value = "")]
    pub sign_keys: String,

    /// Key type, the file stem of each key/certificate pair
    #[arg(long, env = "APK_KEY_TYPE", default_value = DEFAULT_KEY_TYPE)]
    pub key_type: String,

    /// Directory holding one sign-apk-<id> folder per key
    #[arg(long, env = "APK_SIGN_KEY_ROOT", default_value = DEFAULT_KEY_ROOT)]
    pub key_root: PathBuf,

    /// Comma separated build kinds, first match wins when renaming
    #[arg(long, env = "APK_OUTPUT_KEYS", default_value = "release,debug")]
    pub output_kinds: String,

    /// Comma separated distribution channels
    #[arg(long, env = "APK_PUSH_SUBDIR", default_value = "")]
    pub output_channels: String,

    /// Output root; the method key is appended
    #[arg(long, env = "OUTPUT", default_value = DEFAULT_OUTPUT_ROOT)]
    pub output: PathBuf,

    /// Unity project root (default: current directory)
    #[arg(long, env = "PROJECT_PATH", value_name = "PATH")]
    pub project_path: Option<PathBuf>,

    /// zipalign executable (default: under $HOME/android-sdk-linux)
    #[arg(long, env = "ZIPALIGN", value_name = "PATH")]
    pub zipalign: Option<PathBuf>,

    /// Java runtime launching the signer
    #[arg(long, env = "JAVA", default_value = "java")]
    pub java: PathBuf,

    /// apksigner jar (default: under $HOME/src/github)
    #[arg(long, env = "APK_SIGNER_JAR", value_name = "PATH")]
    pub apksigner_jar: Option<PathBuf>,

    /// Object storage command line client
    #[arg(long, env = "TOSUTIL", default_value = "tosutil")]
    pub tosutil: PathBuf,

    /// Object storage bucket URL
    #[arg(long, env = "TOS_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Build registry endpoint
    #[arg(long, env = "PDM_ENDPOINT", default_value = DEFAULT_REGISTRY_ENDPOINT)]
    pub registry_endpoint: String,

    /// Build registry project
    #[arg(long, env = "PDM_PROJECT", default_value = DEFAULT_PROJECT)]
    pub registry_project: String,

    /// Registry repo name
    #[arg(long, env = "pdm_repo", default_value = DEFAULT_REPO)]
    pub repo: String,

    /// Remote destination of the comma-joined link list
    #[arg(long, env = "toslinkfile", value_name = "URL")]
    pub link_list: Option<String>,

    /// Artifact digest: md5 or sha256
    #[arg(long, env = "APK_DIGEST", default_value = "md5")]
    pub digest: String,

    /// Zip the signed outputs and upload the archive too
    #[arg(
        long,
        env = "APK_ARCHIVE",
        action = ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub archive: bool,

    /// Only print errors and the final summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.build_tool.as_os_str().is_empty() {
            return Err("Build tool path cannot be empty".to_string());
        }

        if self.product.trim().is_empty() {
            return Err("Product name cannot be empty".to_string());
        }

        if method_key(&self.method).is_none() {
            return Err(format!(
                "Invalid method: {}. Expected <Class>.<Method>, e.g. ProjectBuild.BuildForAndroid",
                self.method
            ));
        }

        if self.digest.parse::<DigestAlgorithm>().is_err() {
            return Err(format!(
                "Invalid digest: {}. Valid digests: md5, sha256",
                self.digest
            ));
        }

        Ok(())
    }

    /// Tool locations, filling unset ones from the home directory layout.
    pub fn tool_paths(&self) -> anyhow::Result<ToolPaths> {
        let mut tools = match (&self.zipalign, &self.apksigner_jar) {
            (Some(zipalign), Some(jar)) => ToolPaths {
                build_tool: self.build_tool.clone(),
                zipalign: zipalign.clone(),
                java: PathBuf::new(),
                apksigner_jar: jar.clone(),
                object_store: PathBuf::new(),
            },
            _ => {
                let home = dirs::home_dir()
                    .context("cannot locate the home directory; set ZIPALIGN and APK_SIGNER_JAR")?;
                let mut tools = ToolPaths::with_home(self.build_tool.clone(), &home);
                if let Some(zipalign) = &self.zipalign {
                    tools.zipalign = zipalign.clone();
                }
                if let Some(jar) = &self.apksigner_jar {
                    tools.apksigner_jar = jar.clone();
                }
                tools
            }
        };
        tools.java = self.java.clone();
        tools.object_store = self.tosutil.clone();
        Ok(tools)
    }

    /// Folds the arguments into the run's [`BuildContext`].
    pub fn to_context(&self) -> crate::Result<BuildContext> {
        let digest = self.digest.parse::<DigestAlgorithm>()?;

        let product = ProductSettings {
            product_name: self.product.trim().to_string(),
            method: self.method.clone(),
            version: non_empty(&self.version_name),
            version_code: non_empty(&self.version_code),
            commit_id: self.commit.clone(),
            build_tag: self.build_tag.clone(),
            build_revision: self.build_revision.clone(),
            branch: self.branch.clone(),
        };

        let signing = SigningSettings {
            key_ids: split_list(&self.sign_keys),
            key_type: self.key_type.clone(),
            key_root: self.key_root.clone(),
        };

        let publish = PublishSettings {
            bucket: self.bucket.trim_end_matches('/').to_string(),
            registry_endpoint: self.registry_endpoint.clone(),
            project: self.registry_project.clone(),
            repo: self.repo.clone(),
            link_list_destination: non_empty(&self.link_list),
            digest,
        };

        let mut builder = BuildContextBuilder::new()
            .product(product)
            .output_root(&self.output)
            .signing(signing)
            .publish(publish)
            .tools(self.tool_paths()?)
            .output_channels(split_list(&self.output_channels))
            .archive_outputs(self.archive);

        let kinds = split_list(&self.output_kinds);
        if !kinds.is_empty() {
            builder = builder.output_kinds(kinds);
        }
        if let Some(root) = &self.project_path {
            builder = builder.project_root(root);
        }

        Ok(builder.build()?)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(!args.quiet, args.quiet);
        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) {
        self.output.verbose(message)
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        self.output.indent(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Serializes tests that read or write the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn argv(extra: &[&str]) -> Vec<String> {
        let mut argv = vec![
            "apk_release_stager",
            "/opt/unity",
            "Launcher",
            "ProjectBuild.BuildForAndroid",
            "--zipalign",
            "/sdk/zipalign",
            "--apksigner-jar",
            "/sdk/apksigner.jar",
            "--project-path",
            "/work/launcher",
        ];
        argv.extend_from_slice(extra);
        argv.into_iter().map(String::from).collect()
    }

    fn parse(extra: &[&str]) -> Args {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        Args::try_parse_from(argv(extra)).unwrap()
    }

    #[test]
    fn archive_flag_accepts_boolish_env_values() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for (value, expected) in [("1", true), ("yes", true), ("true", true), ("0", false), ("off", false)] {
            // SAFETY: environment access is serialized by ENV_LOCK.
            unsafe { std::env::set_var("APK_ARCHIVE", value) };
            let parsed = Args::try_parse_from(argv(&[]));
            unsafe { std::env::remove_var("APK_ARCHIVE") };
            assert_eq!(parsed.unwrap().archive, expected, "APK_ARCHIVE={value}");
        }
    }

    #[test]
    fn method_without_key_is_rejected() {
        let mut args = parse(&[]);
        args.method = "BuildForAndroid".into();
        assert!(args.validate().unwrap_err().contains("Invalid method"));

        args.method = "ProjectBuild.".into();
        assert!(args.validate().is_err());
    }

    #[test]
    fn unknown_digest_is_rejected() {
        let args = parse(&["--digest", "crc32"]);
        assert!(args.validate().unwrap_err().contains("crc32"));
    }

    #[test]
    fn flags_fold_into_context() {
        let args = parse(&[
            "--version-name",
            "1.3.1",
            "--version-code",
            " ",
            "--sign-keys",
            "keyA,,keyB",
            "--output-channels",
            "cn, global",
            "--output",
            "/out/",
            "--bucket",
            "tos://bucket/",
            "--digest",
            "sha256",
        ]);
        args.validate().unwrap();
        let ctx = args.to_context().unwrap();

        assert_eq!(ctx.method_key(), "BuildForAndroid");
        assert_eq!(ctx.version(), Some("1.3.1"));
        assert_eq!(ctx.version_code(), None);
        assert_eq!(ctx.signing().key_ids, ["keyA", "keyB"]);
        assert_eq!(ctx.output_channels(), ["cn", "global"]);
        assert_eq!(ctx.output_root(), std::path::Path::new("/out/BuildForAndroid"));
        assert_eq!(ctx.project_root(), std::path::Path::new("/work/launcher"));
        assert_eq!(ctx.publish().bucket, "tos://bucket");
        assert_eq!(ctx.publish().digest, DigestAlgorithm::Sha256);
        assert_eq!(ctx.tools().zipalign, PathBuf::from("/sdk/zipalign"));
    }

    #[test]
    fn blank_kinds_fall_back_to_defaults() {
        let args = parse(&["--output-kinds", " , "]);
        let ctx = args.to_context().unwrap();
        assert_eq!(ctx.output_kinds(), ["release", "debug"]);
    }
}
