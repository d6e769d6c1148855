//! External tool availability checking.
//!
//! The preflight only warns: the stage that needs a missing tool reports the
//! real failure with its own policy.

use crate::staging::BuildContext;
use std::path::{Path, PathBuf};

/// Availability of one external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    /// Role of the tool in the pipeline.
    pub role: &'static str,
    /// Path as configured.
    pub configured: PathBuf,
    /// Resolved executable, if found.
    pub resolved: Option<PathBuf>,
}

/// Resolves `tool` through `PATH` (bare names) or checks it directly (paths).
pub fn locate(tool: &Path) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool.display(), path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found: {}", tool.display(), e);
            None
        }
    }
}

/// Checks every tool the run will invoke and warns about the missing ones.
pub fn preflight(context: &BuildContext) -> Vec<ToolStatus> {
    let tools = context.tools();
    let mut checks = vec![("build tool", &tools.build_tool), ("zipalign", &tools.zipalign)];
    if !context.signing().key_ids.is_empty() {
        checks.push(("java", &tools.java));
    }
    checks.push(("object storage client", &tools.object_store));

    let mut statuses: Vec<ToolStatus> = checks
        .into_iter()
        .map(|(role, path)| ToolStatus {
            role,
            configured: path.clone(),
            resolved: locate(path),
        })
        .collect();

    if !context.signing().key_ids.is_empty() {
        let jar = &tools.apksigner_jar;
        statuses.push(ToolStatus {
            role: "apksigner jar",
            configured: jar.clone(),
            resolved: jar.is_file().then(|| jar.clone()),
        });
    }

    for status in &statuses {
        match &status.resolved {
            Some(path) => log::info!("✓ {} available: {}", status.role, path.display()),
            None => log::warn!(
                "{} not found at {}; the stage using it will fail",
                status.role,
                status.configured.display()
            ),
        }
    }

    statuses
}
