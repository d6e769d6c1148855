//! zipalign of renamed packages from `origin` into `app`.

use crate::staging::{
    BuildContext, FileRole, OutputManifest, StageFailure, StagedFile,
    error::{Error, Result, Stage},
    settings::PACKAGE_EXTENSION,
    utils::{fs, process::ToolCommand},
};
use std::path::Path;

/// zipalign invocation: page-align, force overwrite, verbose, 4-byte alignment.
pub fn align_command(zipalign: &Path, input: &Path, output: &Path) -> ToolCommand {
    ToolCommand::new(zipalign)
        .args(["-p", "-f", "-v", "4"])
        .arg(input)
        .arg(output)
}

/// Runs the align stage.
///
/// `app` is created fresh; a leftover from an earlier run is discarded rather
/// than merged. Each package in `origin` is aligned into `app`, then removed
/// from `origin` whatever zipalign's exit status. Every `app` path is appended
/// to the manifest.
pub async fn align_packages(
    context: &BuildContext,
    manifest: &mut OutputManifest,
) -> Result<Vec<StageFailure>> {
    let origin = context.origin_dir();
    let app = context.app_dir();
    fs::create_fresh_dir(&app).await?;

    let mut failures = Vec::new();
    for input in fs::list_files(&origin).await? {
        if !fs::has_extension(&input, PACKAGE_EXTENSION) {
            continue;
        }
        let staged = StagedFile::new(&input, FileRole::RenamedPackage);
        let output = app.join(staged.file_name());

        let status = align_command(&context.tools().zipalign, &input, &output)
            .current_dir(context.project_root())
            .status()
            .await;
        let failure = match status {
            Ok(status) if status.success() => None,
            Ok(status) => Some(Error::ToolExited {
                command: format!("zipalign {}", staged.file_name()),
                code: status.code(),
            }),
            Err(e) => Some(e),
        };
        if let Some(error) = failure {
            Stage::Align.settle(error, &mut failures)?;
        }

        fs::remove_file(&input).await?;
        log::info!("Aligned {}", output.display());
        if let Some(aligned) = staged.advance(output, FileRole::AlignedPackage) {
            manifest.push(aligned);
        }
    }

    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_fixed_flags() {
        let cmd = align_command(
            Path::new("zipalign"),
            Path::new("/o/origin/a.apk"),
            Path::new("/o/app/a.apk"),
        );
        assert_eq!(
            cmd.arguments(),
            ["-p", "-f", "-v", "4", "/o/origin/a.apk", "/o/app/a.apk"]
        );
    }
}
