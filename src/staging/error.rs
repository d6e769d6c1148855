//! Error types for the staging pipeline.
//!
//! Besides the [`Error`] enum this module carries the per-stage failure
//! policy table: which stages abort the run and which only log.

use std::{fmt::Display, path::Path, path::PathBuf};
use thiserror::Error as DeriveError;

/// Result type alias for staging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while staging a build into release artifacts.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Bare I/O error without further context.
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    /// I/O error while acting on a specific path.
    #[error("{action} `{path}`: {error}")]
    Fs {
        /// What was being done.
        action: String,
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        error: std::io::Error,
    },

    /// An external tool could not be spawned at all.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Tool that failed to start.
        command: String,
        /// Spawn error.
        #[source]
        error: std::io::Error,
    },

    /// The build tool exited unsuccessfully.
    #[error("build tool failed with exit code {code:?}, see {log_file}")]
    BuildFailed {
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Log file handed to the build tool.
        log_file: String,
    },

    /// An external tool ran but exited unsuccessfully.
    #[error("`{command}` exited with code {code:?}")]
    ToolExited {
        /// Tool and the file it worked on.
        command: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },

    /// A renamed copy was still missing after the retry.
    #[error("copy to `{0}` failed twice")]
    CopyVerification(PathBuf),

    /// A staging directory that must be fresh could not be reset.
    #[error("staging directory `{0}` already exists and could not be reset")]
    StagingDirConflict(PathBuf),

    /// A manifest entry vanished before it could be uploaded.
    #[error("artifact `{0}` is missing or unreadable")]
    MissingArtifact(PathBuf),

    /// The object storage tool rejected an upload.
    #[error("upload of `{path}` to `{remote}` exited with code {code:?}")]
    UploadFailed {
        /// Local file.
        path: PathBuf,
        /// Remote destination.
        remote: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
    },

    /// Neither the POST nor the PUT of the manifest was accepted.
    #[error("registry rejected the manifest (POST: {post}, PUT: {put})")]
    RegistryRejected {
        /// What the POST returned.
        post: String,
        /// What the PUT returned.
        put: String,
    },

    /// The registry request could not be sent.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Manifest serialization failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Archive creation failed.
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),

    /// A fatal stage failure; later stages did not run.
    #[error("{stage} stage failed: {source}")]
    StageFailed {
        /// Stage that aborted the run.
        stage: Stage,
        /// What went wrong.
        #[source]
        source: Box<Error>,
    },

    /// Configuration is incomplete or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Anything else.
    #[error("{0}")]
    GenericError(String),
}

/// Attaches filesystem context to I/O results.
pub trait ErrorExt<T> {
    /// Wraps an I/O error with the action and path it happened on.
    fn fs_context(self, action: &str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, action: &str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            action: action.to_string(),
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Attaches a message to an error or a missing value.
pub trait Context<T> {
    /// Converts the failure into [`Error::GenericError`] prefixed with `msg`.
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T>;
}

impl<T, E: std::error::Error> Context<T> for std::result::Result<T, E> {
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{msg}: {e}")))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display + Send + Sync + 'static>(self, msg: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(msg.to_string()))
    }
}

/// Returns early with an [`Error::GenericError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::staging::Error::GenericError(format!($($arg)*)))
    };
}

/// What happens to the run when a stage reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Abort the run, exit code 2. Completed stages are not undone.
    Fatal,
    /// Report the failure and keep going.
    Logged,
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Settings rewrite before the build.
    VersionPatch,
    /// External build tool invocation.
    Build,
    /// Canonical renaming inside `origin`.
    Rename,
    /// `origin` -> `app` through zipalign.
    Align,
    /// Per-key signing into key directories.
    Sign,
    /// Optional zip of the signed outputs.
    Archive,
    /// Object storage upload of every manifest entry.
    Upload,
    /// Manifest POST/PUT to the build registry.
    Registry,
    /// Upload of the comma-joined link list.
    LinkList,
}

impl Stage {
    /// Policy applied when the stage's external tool or remote call fails.
    ///
    /// Local filesystem errors abort the run whatever the stage.
    pub fn failure_policy(self) -> ErrorPolicy {
        match self {
            Stage::Align | Stage::Sign | Stage::Registry => ErrorPolicy::Logged,
            Stage::VersionPatch
            | Stage::Build
            | Stage::Rename
            | Stage::Archive
            | Stage::Upload
            | Stage::LinkList => ErrorPolicy::Fatal,
        }
    }

    /// Applies [`Stage::failure_policy`] to a tool or remote failure.
    ///
    /// A fatal failure comes back as [`Error::StageFailed`]; a logged one is
    /// appended to `failures` and the stage carries on.
    pub fn settle(self, error: Error, failures: &mut Vec<StageFailure>) -> Result<()> {
        match self.failure_policy() {
            ErrorPolicy::Fatal => Err(Error::StageFailed {
                stage: self,
                source: Box::new(error),
            }),
            ErrorPolicy::Logged => {
                log::warn!("{self} (continued): {error}");
                failures.push(StageFailure {
                    stage: self,
                    message: error.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Human readable stage name used in logs.
    pub fn label(self) -> &'static str {
        match self {
            Stage::VersionPatch => "version patch",
            Stage::Build => "build",
            Stage::Rename => "rename",
            Stage::Align => "align",
            Stage::Sign => "sign",
            Stage::Archive => "archive",
            Stage::Upload => "upload",
            Stage::Registry => "registry",
            Stage::LinkList => "link list",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A failure that a [`ErrorPolicy::Logged`] stage reported without stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    /// Stage that failed.
    pub stage: Stage,
    /// What went wrong.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_upload_are_fatal_while_sign_and_registry_only_log() {
        assert_eq!(Stage::Build.failure_policy(), ErrorPolicy::Fatal);
        assert_eq!(Stage::Upload.failure_policy(), ErrorPolicy::Fatal);
        assert_eq!(Stage::LinkList.failure_policy(), ErrorPolicy::Fatal);
        assert_eq!(Stage::Rename.failure_policy(), ErrorPolicy::Fatal);

        assert_eq!(Stage::Sign.failure_policy(), ErrorPolicy::Logged);
        assert_eq!(Stage::Registry.failure_policy(), ErrorPolicy::Logged);
        assert_eq!(Stage::Align.failure_policy(), ErrorPolicy::Logged);
    }

    #[test]
    fn settle_follows_the_policy_table() {
        let mut failures = Vec::new();

        Stage::Sign
            .settle(
                Error::ToolExited {
                    command: "apksigner a.apk".into(),
                    code: Some(1),
                },
                &mut failures,
            )
            .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, Stage::Sign);
        assert!(failures[0].message.contains("apksigner a.apk"));

        let err = Stage::Upload
            .settle(
                Error::UploadFailed {
                    path: "a.apk".into(),
                    remote: "tos://b/a.apk".into(),
                    code: Some(2),
                },
                &mut failures,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StageFailed {
                stage: Stage::Upload,
                ..
            }
        ));
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn fs_context_keeps_path() {
        let err = std::fs::read("/definitely/not/here")
            .fs_context("reading", "/definitely/not/here")
            .unwrap_err();
        match err {
            Error::Fs { action, path, .. } => {
                assert_eq!(action, "reading");
                assert_eq!(path, PathBuf::from("/definitely/not/here"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn option_context_becomes_generic_error() {
        let none: Option<u8> = None;
        let err = none.context("no value").unwrap_err();
        assert_eq!(err.to_string(), "no value");
    }
}
