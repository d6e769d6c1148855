//! Locations of the external tools the pipeline drives.

use std::path::PathBuf;

/// Executables invoked by the stages.
///
/// Bare names (`java`, `tosutil`) are resolved through `PATH` when spawned.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Unity editor executable.
    pub build_tool: PathBuf,

    /// Android `zipalign`.
    pub zipalign: PathBuf,

    /// Java runtime used to launch the signer.
    pub java: PathBuf,

    /// `apksigner` jar.
    pub apksigner_jar: PathBuf,

    /// Object storage command line client.
    pub object_store: PathBuf,
}

impl ToolPaths {
    /// Defaults relative to a home directory, matching the CI agents' layout.
    pub fn with_home(build_tool: PathBuf, home: &std::path::Path) -> Self {
        Self {
            build_tool,
            zipalign: home.join("android-sdk-linux/build-tools/29.0.1/zipalign"),
            java: PathBuf::from("java"),
            apksigner_jar: home.join("src/github/smartcm/scm-helpers/.apksigner.jar"),
            object_store: PathBuf::from("tosutil"),
        }
    }
}
