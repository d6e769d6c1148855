//! Blocking-until-exit invocation of external tools.
//!
//! Every tool is spawned with an explicit argument vector, never through a
//! shell, and awaited to completion. No timeout is applied.

use crate::staging::error::{Error, Result};
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::ExitStatus,
};
use tokio::process::Command;

/// A fully described external invocation.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Starts describing an invocation of `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Runs the tool from `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program being run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, in order, lossily converted for logs and assertions.
    pub fn arguments(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Printable command line, for logs only.
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the tool, inheriting stdio, and waits for it to exit.
    ///
    /// Only a failure to spawn is an error; the exit status is returned for
    /// the caller to classify.
    pub async fn status(&self) -> Result<ExitStatus> {
        log::debug!("$ {}", self.display());

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        command.status().await.map_err(|error| Error::CommandFailed {
            command: self.program.display().to_string(),
            error,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_exit_status_without_failing() {
        let status = ToolCommand::new("sh").args(["-c", "exit 3"]).status().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn spawn_failure_is_an_error() {
        let err = ToolCommand::new("/nonexistent/tool").status().await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn non_utf8_arguments_reach_the_tool_unchanged() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"caf\xe9.apk");
        let status = ToolCommand::new("sh")
            .args(["-c", r#"[ "$1" = "$(printf 'caf\351.apk')" ]"#, "sh"])
            .arg(name)
            .status()
            .await
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn display_joins_program_and_args() {
        let cmd = ToolCommand::new("zipalign").args(["-p", "-f", "4"]);
        assert_eq!(cmd.display(), "zipalign -p -f 4");
    }
}
