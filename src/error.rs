//! Top-level error types and exit-code mapping.
//!
//! Every failure that reaches `main` ends the process with exit code 2, the
//! same code clap uses for usage errors.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, StagerError>;

/// Exit code of every failed run.
pub const FAILURE_EXIT_CODE: i32 = 2;

/// Main error type reaching the binary
#[derive(Error, Debug)]
pub enum StagerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Staging pipeline errors
    #[error("Staging error: {0}")]
    Staging(#[from] crate::staging::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl StagerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        FAILURE_EXIT_CODE
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::staging::{Error, Stage};

        match self {
            StagerError::Cli(_) => vec![
                "Usage: apk_release_stager <BUILD_TOOL> <PRODUCT> <METHOD>".to_string(),
                "Run with --help for the environment variables read".to_string(),
            ],
            StagerError::Staging(Error::StageFailed { stage, .. }) => match stage {
                Stage::Build => vec!["Inspect build.log in the project root".to_string()],
                Stage::Upload | Stage::LinkList => vec![
                    "Check the object storage client credentials (TOSUTIL)".to_string(),
                ],
                _ => vec!["Set RUST_LOG=debug to see every tool invocation".to_string()],
            },
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
