//! Main staging orchestration.
//!
//! This module provides the [`Stager`] that drives one build through every
//! stage, strictly in order, once.

use crate::staging::{
    BuildContext, OutputManifest, StagedFile,
    error::{Error, Result, Stage, StageFailure},
    registry::RegistryClient,
    stages::{align, archive, build, rename, sign, upload, version_patch},
};
use std::path::PathBuf;

use super::tool_detection;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct PipelineReport {
    /// Files that were uploaded, in upload order.
    pub manifest: OutputManifest,
    /// Packages renamed to canonical names.
    pub renamed: Vec<StagedFile>,
    /// Packages that matched no kind/channel pair.
    pub untouched: Vec<PathBuf>,
    /// Signed outputs that were attempted.
    pub signed: Vec<PathBuf>,
    /// Archive of the signed outputs, when enabled.
    pub archive: Option<PathBuf>,
    /// Upload results, registry answer included.
    pub upload: upload::UploadOutcome,
    /// Failures of stages whose policy is
    /// [`ErrorPolicy::Logged`](crate::staging::ErrorPolicy::Logged), in run order.
    pub failures: Vec<StageFailure>,
    /// Stages that completed, in order.
    pub completed: Vec<Stage>,
}

/// Drives one staging run.
///
/// # Examples
///
/// ```no_run
/// use apk_release_stager::staging::{BuildContext, HttpRegistry, Stager};
///
/// # async fn example(context: BuildContext) -> apk_release_stager::staging::Result<()> {
/// let registry = HttpRegistry::new(context.publish().registry_endpoint.clone());
/// let report = Stager::new(context, registry).run().await?;
/// println!("uploaded {} file(s)", report.upload.records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Stager<R> {
    context: BuildContext,
    registry: R,
}

impl<R: RegistryClient> Stager<R> {
    /// Creates a stager for `context`, registering builds with `registry`.
    pub fn new(context: BuildContext, registry: R) -> Self {
        Self { context, registry }
    }

    /// Returns the run configuration.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Runs every stage from the settings patch to the upload.
    pub async fn run(&self) -> Result<PipelineReport> {
        tool_detection::preflight(&self.context);

        let mut completed = Vec::new();
        guard(Stage::VersionPatch, version_patch::patch_project(&self.context).await)?;
        completed.push(Stage::VersionPatch);

        let build_failures = guard(Stage::Build, build::build_package(&self.context).await)?;
        completed.push(Stage::Build);

        let mut report = self.stage_artifacts().await?;
        completed.append(&mut report.completed);
        report.completed = completed;
        let mut failures = build_failures;
        failures.append(&mut report.failures);
        report.failures = failures;
        Ok(report)
    }

    /// Runs the stages after the build: rename, align, sign, archive, upload.
    ///
    /// Expects the raw build output to be in the origin directory already.
    pub async fn stage_artifacts(&self) -> Result<PipelineReport> {
        let context = &self.context;
        let mut manifest = OutputManifest::new();
        let mut failures = Vec::new();
        let mut completed = Vec::new();

        let renamed = guard(Stage::Rename, rename::rename_outputs(context, &mut manifest).await)?;
        completed.push(Stage::Rename);

        failures.extend(guard(
            Stage::Align,
            align::align_packages(context, &mut manifest).await,
        )?);
        completed.push(Stage::Align);

        let signed = guard(Stage::Sign, sign::sign_packages(context, &mut manifest).await)?;
        failures.extend(signed.failures);
        completed.push(Stage::Sign);

        let archive = if context.archive_outputs() {
            let path = guard(
                Stage::Archive,
                archive::archive_signed(context, &mut manifest).await,
            )?;
            completed.push(Stage::Archive);
            path
        } else {
            None
        };

        let mut upload = guard(
            Stage::Upload,
            upload::upload_artifacts(context, &manifest, &self.registry).await,
        )?;
        completed.push(Stage::Upload);

        failures.append(&mut upload.failures);
        completed.push(Stage::Registry);
        if upload.link_list.is_some() {
            completed.push(Stage::LinkList);
        }

        Ok(PipelineReport {
            manifest,
            renamed: renamed.renamed,
            untouched: renamed.untouched,
            signed: signed.attempted,
            archive,
            upload,
            failures,
            completed,
        })
    }
}

/// Tags a stage error with the stage that raised it.
///
/// Tool and remote failures were already settled by the stage through its
/// policy; anything else reaching here is a local failure and always fatal.
fn guard<T>(stage: Stage, result: Result<T>) -> Result<T> {
    result.map_err(|source| {
        log::error!("{stage} stage failed, aborting: {source}");
        match source {
            Error::StageFailed { .. } => source,
            source => Error::StageFailed {
                stage,
                source: Box::new(source),
            },
        }
    })
}
