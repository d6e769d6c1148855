//! Headless Unity build of the raw Android package.

use crate::staging::{
    BuildContext, StageFailure,
    error::{Error, Result, Stage},
    settings::BUILD_LOG_FILE,
    utils::{fs, process::ToolCommand},
};

/// Scratch directory Unity leaves under the project root.
pub const BUILD_SCRATCH_DIR: &str = "build";

/// Assembles the build tool invocation.
///
/// The version pair is only passed when both version and version code are set.
pub fn build_command(context: &BuildContext) -> ToolCommand {
    let mut command = ToolCommand::new(&context.tools().build_tool)
        .args(["-batchmode", "-nographics", "-buildTarget", "android"])
        .arg("-projectPath")
        .arg(context.project_root())
        .arg("-executeMethod")
        .arg(context.method())
        .arg(format!("productName={}", context.product_name()))
        .arg(format!(
            "outputPath={}",
            context.raw_package_path().display()
        ));

    if let (Some(version), Some(code)) = (context.version(), context.version_code()) {
        command = command
            .arg(format!("version={version}"))
            .arg(format!("versionCode={code}"));
    }

    command
        .args(["-logFile", BUILD_LOG_FILE, "-quit", "-upmNoDefaultPackages"])
        .current_dir(context.project_root())
}

/// Clears leftovers of a previous run, then runs the build tool.
///
/// A non-zero exit is settled through [`Stage::Build`]'s policy, fatal by
/// default since the raw package is unusable.
pub async fn build_package(context: &BuildContext) -> Result<Vec<StageFailure>> {
    for dir in [
        context.project_root().join(BUILD_SCRATCH_DIR),
        context.origin_dir(),
    ] {
        if fs::clear_dir(&dir).await? {
            log::info!("Cleared {}", dir.display());
        }
    }

    let command = build_command(context);
    log::info!(
        "Building {} via {}",
        context.product_name(),
        context.method()
    );

    let mut failures = Vec::new();
    let status = command.status().await?;
    if !status.success() {
        log::error!("build tool exited with {status}");
        let error = Error::BuildFailed {
            code: status.code(),
            log_file: context.project_root().join(BUILD_LOG_FILE).display().to_string(),
        };
        Stage::Build.settle(error, &mut failures)?;
        return Ok(failures);
    }

    log::info!("✓ Build finished: {}", context.raw_package_path().display());
    Ok(failures)
}
