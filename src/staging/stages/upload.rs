//! Object storage upload, registry manifest and link list.

use crate::staging::{
    BuildContext, OutputManifest, StagedFile,
    builder::checksum::calculate_digest,
    error::{Error, ErrorExt, Result, Stage, StageFailure},
    registry::{ArtifactRecord, BuildManifest, RegistryClient, RegistryOutcome, submit_manifest},
    utils::process::ToolCommand,
};
use chrono::Local;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// Object key of `file`:
/// `app/{product}/{revision}/{method key}/{parent dir}/{file name}`.
pub fn remote_key(context: &BuildContext, file: &StagedFile) -> String {
    format!(
        "app/{}/{}/{}/{}/{}",
        context.product_name(),
        context.product().build_revision,
        context.method_key(),
        file.parent_name(),
        file.file_name()
    )
}

/// Full remote URL of `key` in `bucket`.
pub fn remote_url(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket.trim_end_matches('/'), key)
}

/// `<tool> cp <local> <remote>`.
pub fn upload_command(tool: &Path, local: &Path, remote: &str) -> ToolCommand {
    ToolCommand::new(tool).arg("cp").arg(local).arg(remote)
}

/// Hashes and measures `file`.
///
/// A file that is gone is [`Error::MissingArtifact`]; any other read failure
/// is returned as is, with its path and OS error.
pub async fn build_record(context: &BuildContext, file: &StagedFile) -> Result<ArtifactRecord> {
    let missing = || Error::MissingArtifact(file.path().to_path_buf());
    let digest = match calculate_digest(file.path(), context.publish().digest).await {
        Ok(digest) => digest,
        Err(Error::Fs { error, .. }) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(missing());
        }
        Err(e) => return Err(e),
    };
    let metadata = tokio::fs::metadata(file.path())
        .await
        .map_err(|_| missing())?;

    Ok(ArtifactRecord {
        size: metadata.len(),
        create_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        digest,
        tos_key: remote_key(context, file),
        name: file.file_name(),
        uploaded: true,
    })
}

async fn copy_to_remote(context: &BuildContext, local: &Path, remote: &str) -> Result<()> {
    log::info!("upload: {} -> {remote}", local.display());
    let status = upload_command(&context.tools().object_store, local, remote)
        .current_dir(context.project_root())
        .status()
        .await?;
    if !status.success() {
        return Err(Error::UploadFailed {
            path: local.to_path_buf(),
            remote: remote.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

/// Result of the upload stage.
#[derive(Debug)]
pub struct UploadOutcome {
    /// Records keyed by file name.
    pub records: BTreeMap<String, ArtifactRecord>,
    /// Remote URLs, in manifest order.
    pub links: Vec<String>,
    /// Registry answer.
    pub registry: RegistryOutcome,
    /// Local link list, when one was uploaded.
    pub link_list: Option<PathBuf>,
    /// Failures the policy table let through (registry rejection by default).
    pub failures: Vec<StageFailure>,
}

/// Runs the upload stage.
///
/// Every manifest entry is hashed and copied to object storage, then the
/// manifest is submitted to the registry and the link list, if configured,
/// is written and uploaded. Failed copies, a rejected manifest and a failed
/// link list upload are settled through the [`Stage::Upload`],
/// [`Stage::Registry`] and [`Stage::LinkList`] policies.
pub async fn upload_artifacts<R: RegistryClient>(
    context: &BuildContext,
    manifest: &OutputManifest,
    registry: &R,
) -> Result<UploadOutcome> {
    if context.product().branch.trim().is_empty() {
        return Err(Error::Config(
            "source branch (GIT_BRANCH_NAME) is required to register the build".into(),
        ));
    }

    let bucket = &context.publish().bucket;
    let mut records = BTreeMap::new();
    let mut links = Vec::with_capacity(manifest.len());
    let mut failures = Vec::new();

    log::info!("Uploading {} file(s)", manifest.len());
    for file in manifest.entries() {
        let record = build_record(context, file).await?;
        let remote = remote_url(bucket, &record.tos_key);
        if let Err(e) = copy_to_remote(context, file.path(), &remote).await {
            Stage::Upload.settle(e, &mut failures)?;
            continue;
        }

        links.push(remote);
        records.insert(record.name.clone(), record);
    }

    let payload = BuildManifest::new(context, records.clone());
    log::debug!("registry payload: {}", serde_json::to_string(&payload)?);
    let registry = submit_manifest(registry, &payload).await;
    if let RegistryOutcome::Rejected { post, put } = &registry {
        let rejected = Error::RegistryRejected {
            post: post.clone(),
            put: put.clone(),
        };
        Stage::Registry.settle(rejected, &mut failures)?;
    }

    let link_list = match &context.publish().link_list_destination {
        Some(destination) => {
            let path = context.link_list_file();
            tokio::fs::write(&path, links.join(","))
                .await
                .fs_context("writing link list", &path)?;
            match copy_to_remote(context, &path, destination).await {
                Ok(()) => Some(path),
                Err(e) => {
                    Stage::LinkList.settle(e, &mut failures)?;
                    None
                }
            }
        }
        None => None,
    };

    Ok(UploadOutcome {
        records,
        links,
        registry,
        link_list,
        failures,
    })
}
