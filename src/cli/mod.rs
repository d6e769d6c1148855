//! Command line interface for the release stager.
//!
//! Parses the CI invocation, builds the run's context, drives the
//! [`Stager`](crate::staging::Stager) and prints a summary.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::error::{CliError, Result};
use crate::staging::{HttpRegistry, PipelineReport, RegistryOutcome, Stager};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let runtime = RuntimeConfig::from(&args);
    let context = args.to_context()?;

    runtime.section(&format!(
        "Staging {} ({}, version {})",
        context.product_name(),
        context.method_key(),
        context.version_label()
    ));
    runtime.verbose_println(&format!("project root: {}", context.project_root().display()));
    runtime.verbose_println(&format!("output root:  {}", context.output_root().display()));
    if context.signing().key_ids.is_empty() {
        runtime.warn("No signing keys configured (APK_SIGN_KEYS); only aligned packages will be uploaded");
    }

    let registry = HttpRegistry::new(context.publish().registry_endpoint.clone());
    runtime.progress(&format!("Registry endpoint: {}", registry.endpoint()));

    let report = Stager::new(context, registry).run().await?;
    print_report(&runtime, &report);
    Ok(0)
}

fn print_report(runtime: &RuntimeConfig, report: &PipelineReport) {
    runtime.section("Summary");

    let stages: Vec<String> = report.completed.iter().map(|s| s.to_string()).collect();
    runtime.verbose_println(&format!("completed stages: {}", stages.join(", ")));

    for file in &report.renamed {
        runtime.indent(&format!("renamed  {}", file.file_name()));
    }
    for path in &report.untouched {
        runtime.warn(&format!(
            "{} matched no kind/channel pair and kept its name",
            path.display()
        ));
    }
    for path in &report.signed {
        runtime.indent(&format!("signed   {}", path.display()));
    }
    if let Some(archive) = &report.archive {
        runtime.indent(&format!("archive  {}", archive.display()));
    }

    // a rejection is listed with the other stage failures below
    if let RegistryOutcome::Accepted(verb) = &report.upload.registry {
        runtime.success(&format!("Build registered ({verb:?})"));
    }

    for failure in &report.failures {
        runtime.warn(&format!("{} failed: {}", failure.stage, failure.message));
    }

    let output = runtime.output();
    output.summary(&format!("Uploaded {} file(s):", report.upload.links.len()));
    for link in &report.upload.links {
        output.summary(&format!("  {link}"));
    }
    if let Some(list) = &report.upload.link_list {
        output.summary(&format!("Link list: {}", list.display()));
    }
}
