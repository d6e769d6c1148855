//! Artifact staging pipeline for Unity Android builds.
//!
//! One run takes a freshly built package through a fixed, strictly linear
//! chain of stages:
//!
//! ```text
//! patch -> build -> rename -> align -> sign -> [archive] -> upload
//! ```
//!
//! Each stage finishes before the next starts. A fatal failure stops the run
//! without undoing earlier stages; see [`Stage::failure_policy`] for which
//! failures are fatal.
//!
//! # Example
//!
//! ```no_run
//! use apk_release_stager::staging::{
//!     BuildContextBuilder, HttpRegistry, ProductSettings, SigningSettings, Stager, ToolPaths,
//! };
//!
//! # async fn example() -> apk_release_stager::staging::Result<()> {
//! let context = BuildContextBuilder::new()
//!     .product(ProductSettings {
//!         product_name: "Launcher".into(),
//!         method: "ProjectBuild.BuildForAndroid".into(),
//!         branch: "main".into(),
//!         ..Default::default()
//!     })
//!     .tools(ToolPaths::with_home("/opt/unity/Editor/Unity".into(), "/home/ci".as_ref()))
//!     .output_channels(vec!["cn".into()])
//!     .signing(SigningSettings {
//!         key_ids: vec!["platform".into()],
//!         ..Default::default()
//!     })
//!     .build()?;
//!
//! let registry = HttpRegistry::new(context.publish().registry_endpoint.clone());
//! let report = Stager::new(context, registry).run().await?;
//! for link in &report.upload.links {
//!     println!("{link}");
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod manifest;
pub mod registry;
pub mod settings;
pub mod stages;
pub mod utils;

pub use builder::checksum::{DigestAlgorithm, calculate_digest};
pub use builder::tool_detection;
pub use builder::{PipelineReport, Stager};
pub use error::{Context, Error, ErrorExt, ErrorPolicy, Result, Stage, StageFailure};
pub use manifest::{FileRole, OutputManifest, StagedFile};
pub use registry::{
    ArtifactRecord, BuildManifest, HttpRegistry, RegistryClient, RegistryOutcome, RegistryVerb,
};
pub use settings::{
    BuildContext, BuildContextBuilder, KeyPair, ProductSettings, PublishSettings, SigningSettings,
    ToolPaths, method_key, split_list,
};
