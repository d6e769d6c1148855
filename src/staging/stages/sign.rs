//! Per-key signing of aligned packages.
//!
//! A failing signer does not stop the run: the failure is reported and the
//! remaining files and keys are still attempted.

use crate::staging::{
    BuildContext, FileRole, OutputManifest, StageFailure, StagedFile,
    error::{Error, Result, Stage},
    settings::{KeyPair, PACKAGE_EXTENSION},
    utils::{fs, process::ToolCommand},
};
use std::path::{Path, PathBuf};

/// Inserts `_<key_id>` before the package extension: `a.apk` -> `a_keyA.apk`.
pub fn signed_file_name(file_name: &str, key_id: &str) -> String {
    let suffix = format!(".{PACKAGE_EXTENSION}");
    match file_name.strip_suffix(&suffix) {
        Some(stem) => format!("{stem}_{key_id}{suffix}"),
        None => format!("{file_name}_{key_id}"),
    }
}

/// `java -jar <apksigner> sign --key <pk8> --cert <pem> --out <out> <in>`.
pub fn sign_command(
    java: &Path,
    apksigner_jar: &Path,
    keys: &KeyPair,
    input: &Path,
    output: &Path,
) -> ToolCommand {
    ToolCommand::new(java)
        .arg("-jar")
        .arg(apksigner_jar)
        .arg("sign")
        .arg("--key")
        .arg(&keys.key)
        .arg("--cert")
        .arg(&keys.cert)
        .arg("--out")
        .arg(output)
        .arg(input)
}

/// Result of the sign stage.
#[derive(Debug, Default)]
pub struct SignOutcome {
    /// Every attempted output, whether or not the signer succeeded.
    pub attempted: Vec<PathBuf>,
    /// Signer invocations that failed.
    pub failures: Vec<StageFailure>,
}

/// Runs the sign stage over every file in `app`, for every key identity.
///
/// Attempted outputs are appended to the manifest regardless of exit status.
pub async fn sign_packages(
    context: &BuildContext,
    manifest: &mut OutputManifest,
) -> Result<SignOutcome> {
    let signing = context.signing();
    let tools = context.tools();
    let mut outcome = SignOutcome::default();

    if signing.key_ids.is_empty() {
        log::info!("No signing keys configured, skipping signing");
        return Ok(outcome);
    }

    for input in fs::list_files(&context.app_dir()).await? {
        let aligned = StagedFile::new(&input, FileRole::AlignedPackage);
        let name = aligned.file_name();

        for key_id in signing.key_ids.iter().filter(|id| !id.is_empty()) {
            let key_dir = context.key_dir(key_id);
            fs::create_dir_all(&key_dir).await?;

            let output = key_dir.join(signed_file_name(&name, key_id));
            let keys = signing.key_pair(key_id);
            let command = sign_command(&tools.java, &tools.apksigner_jar, &keys, &input, &output)
                .current_dir(context.project_root());
            log::info!("Signing {name} with {key_id}");

            let failure = match command.status().await {
                Ok(status) if status.success() => None,
                Ok(status) => Some(Error::ToolExited {
                    command: format!("apksigner {name} with key {key_id}"),
                    code: status.code(),
                }),
                Err(e) => Some(e),
            };
            if let Some(error) = failure {
                Stage::Sign.settle(error, &mut outcome.failures)?;
            }

            if let Some(signed) = aligned.advance(&output, FileRole::SignedPackage) {
                manifest.push(signed);
            }
            outcome.attempted.push(output);
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_goes_before_extension() {
        assert_eq!(
            signed_file_name("App_M_c_1_20240101000000_cn-debug.apk", "test"),
            "App_M_c_1_20240101000000_cn-debug_test.apk"
        );
        assert_eq!(signed_file_name("notes", "k"), "notes_k");
    }

    #[test]
    fn passes_key_pair_and_output() {
        let keys = KeyPair {
            key: PathBuf::from("/k/platform.pk8"),
            cert: PathBuf::from("/k/platform.x509.pem"),
        };
        let cmd = sign_command(
            Path::new("java"),
            Path::new("/opt/apksigner.jar"),
            &keys,
            Path::new("/o/app/a.apk"),
            Path::new("/o/keyA/a_keyA.apk"),
        );
        assert_eq!(
            cmd.arguments(),
            [
                "-jar",
                "/opt/apksigner.jar",
                "sign",
                "--key",
                "/k/platform.pk8",
                "--cert",
                "/k/platform.x509.pem",
                "--out",
                "/o/keyA/a_keyA.apk",
                "/o/app/a.apk",
            ]
        );
    }
}
