//! Classification and canonical renaming of the build output.

use crate::staging::{
    BuildContext, FileRole, OutputManifest, StagedFile,
    error::{Error, Result},
    settings::PACKAGE_EXTENSION,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Marker identifying debug symbol files.
pub const SYMBOLS_MARKER: &str = "symbols";

/// Finds the (kind, channel) pair a package name belongs to.
///
/// Kinds are the outer loop and channels the inner one, both in configured
/// order; the first pair whose tags both occur in `file_name` wins.
pub fn classify<'a>(
    file_name: &str,
    kinds: &'a [String],
    channels: &'a [String],
) -> Option<(&'a str, &'a str)> {
    kinds.iter().find_map(|kind| {
        channels
            .iter()
            .find(|channel| file_name.contains(kind.as_str()) && file_name.contains(channel.as_str()))
            .map(|channel| (kind.as_str(), channel.as_str()))
    })
}

/// Outcome of renaming one origin directory.
#[derive(Debug, Default)]
pub struct RenameOutcome {
    /// Renamed packages, in origin listing order.
    pub renamed: Vec<StagedFile>,
    /// Packages that matched no (kind, channel) pair and were left in place.
    pub untouched: Vec<PathBuf>,
}

/// Copies `from` to `to` and checks the copy exists, retrying once.
async fn copy_verified(from: &Path, to: &Path) -> Result<()> {
    copy_with_retry(to, || fs::copy_file(from, to)).await
}

/// Runs `copy` until `to` exists, at most twice.
async fn copy_with_retry<F, Fut>(to: &Path, mut copy: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    for attempt in 1..=2 {
        if let Err(e) = copy().await {
            log::warn!("copy attempt {attempt} to {} failed: {e}", to.display());
        }
        if tokio::fs::try_exists(to).await.unwrap_or(false) {
            return Ok(());
        }
        if attempt == 1 {
            log::warn!("{} missing after copy, retrying once", to.display());
        }
    }
    Err(Error::CopyVerification(to.to_path_buf()))
}

/// Runs the rename stage over the origin directory.
///
/// Symbol files go straight into the manifest. Matching packages are copied to
/// their canonical name and the original is deleted. Packages matching no pair
/// stay where they are and are not reported.
pub async fn rename_outputs(
    context: &BuildContext,
    manifest: &mut OutputManifest,
) -> Result<RenameOutcome> {
    let origin = context.origin_dir();
    let mut outcome = RenameOutcome::default();

    for path in fs::list_files(&origin).await? {
        let file = StagedFile::new(&path, FileRole::RawPackage);
        let name = file.file_name();

        if name.contains(SYMBOLS_MARKER) {
            log::info!("Symbols: {name}");
            manifest.push(StagedFile::new(&path, FileRole::SymbolFile));
            continue;
        }
        if !fs::has_extension(&path, PACKAGE_EXTENSION) {
            continue;
        }

        let Some((kind, channel)) =
            classify(&name, context.output_kinds(), context.output_channels())
        else {
            log::debug!("{name} matches no kind/channel pair, leaving it in place");
            outcome.untouched.push(path);
            continue;
        };

        let target = origin.join(format!(
            "{}.{}",
            context.canonical_name(channel, kind),
            PACKAGE_EXTENSION
        ));
        copy_verified(&path, &target).await?;
        fs::remove_file(&path).await?;

        log::info!("Renamed {name} -> {}", target.display());
        let renamed = file
            .advance(target, FileRole::RenamedPackage)
            .ok_or_else(|| Error::GenericError("rename regressed a file role".into()))?;
        outcome.renamed.push(renamed);
    }

    Ok(outcome)
}
