//! Pre-build rewrite of Unity's persisted project settings.
//!
//! Three line-level substitutions are applied, everything else is copied
//! through unchanged and in order:
//!
//! - `m_ShowUnitySplashScreen: 1` -> `m_ShowUnitySplashScreen: 0`
//! - `m_ShowUnitySplashLogo: 1` -> `m_ShowUnitySplashLogo: 0`
//! - `AndroidBundleVersionCode: <any>` -> `AndroidBundleVersionCode: <code>`
//!
//! The new content is written to a temporary file next to the original and
//! then persisted over it, so the settings file is never partially written.

use crate::staging::{
    BuildContext,
    error::{Error, ErrorExt, Result},
};
use regex::Regex;
use std::{io::Write, path::Path, sync::LazyLock};

static BUNDLE_VERSION_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AndroidBundleVersionCode: (.+)").expect("static regex is valid")
});

/// Rewrites a single settings line.
pub fn patch_line(line: &str, version_code: Option<&str>) -> String {
    if line.contains("m_ShowUnitySplashScreen") {
        line.replace("m_ShowUnitySplashScreen: 1", "m_ShowUnitySplashScreen: 0")
    } else if line.contains("m_ShowUnitySplashLogo") {
        line.replace("m_ShowUnitySplashLogo: 1", "m_ShowUnitySplashLogo: 0")
    } else if let (Some(code), true) = (version_code, line.contains("AndroidBundleVersionCode")) {
        let replacement = format!("AndroidBundleVersionCode: {code}");
        BUNDLE_VERSION_CODE
            .replace(line, regex::NoExpand(&replacement))
            .into_owned()
    } else {
        line.to_string()
    }
}

/// Applies [`patch_line`] to every line, preserving line endings.
pub fn patch_settings(content: &str, version_code: Option<&str>) -> String {
    content
        .split_inclusive('\n')
        .map(|line| {
            let (body, ending) = split_ending(line);
            let mut patched = patch_line(body, version_code);
            patched.push_str(ending);
            patched
        })
        .collect()
}

fn split_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Patches `settings_file` in place through a temporary file.
///
/// The settings file must exist.
pub fn patch_settings_file(settings_file: &Path, version_code: Option<&str>) -> Result<()> {
    let content =
        std::fs::read_to_string(settings_file).fs_context("reading project settings", settings_file)?;
    let patched = patch_settings(&content, version_code);

    let dir = settings_file
        .parent()
        .ok_or_else(|| Error::Config(format!("{} has no parent", settings_file.display())))?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).fs_context("creating temp file in", dir)?;
    temp.write_all(patched.as_bytes())
        .fs_context("writing patched settings", temp.path())?;
    temp.as_file()
        .sync_all()
        .fs_context("flushing patched settings", temp.path())?;
    temp.persist(settings_file)
        .map_err(|e| e.error)
        .fs_context("replacing project settings", settings_file)?;
    Ok(())
}

/// Runs the version patch stage.
///
/// Also removes `ProjectVersion.txt`, so the editor re-detects its version,
/// and a stale `ProjectSettings.asset.bak` from an interrupted run.
pub async fn patch_project(context: &BuildContext) -> Result<()> {
    let settings_file = context.project_settings_file();
    let settings_dir = settings_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| context.project_root().to_path_buf());

    for leftover in ["ProjectVersion.txt", "ProjectSettings.asset.bak"] {
        crate::staging::utils::fs::remove_file(&settings_dir.join(leftover)).await?;
    }

    log::info!(
        "Patching {} (version code {})",
        settings_file.display(),
        context.version_code().unwrap_or("unchanged")
    );

    let version_code = context.version_code().map(str::to_string);
    tokio::task::spawn_blocking(move || patch_settings_file(&settings_file, version_code.as_deref()))
        .await
        .map_err(|e| Error::GenericError(format!("settings patch task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = "PlayerSettings:\n  m_ShowUnitySplashScreen: 1\n  m_ShowUnitySplashLogo: 1\n  AndroidBundleVersionCode: 41\n  companyName: Acme\n";

    #[test]
    fn applies_exactly_three_substitutions() {
        let patched = patch_settings(SETTINGS, Some("100301001"));
        assert_eq!(
            patched,
            "PlayerSettings:\n  m_ShowUnitySplashScreen: 0\n  m_ShowUnitySplashLogo: 0\n  AndroidBundleVersionCode: 100301001\n  companyName: Acme\n"
        );
    }

    #[test]
    fn without_version_code_only_splash_lines_change() {
        let patched = patch_settings(SETTINGS, None);
        assert!(patched.contains("AndroidBundleVersionCode: 41\n"));
        assert!(patched.contains("m_ShowUnitySplashScreen: 0"));
    }

    #[test]
    fn keeps_crlf_and_missing_final_newline() {
        let patched = patch_settings("a\r\n  m_ShowUnitySplashLogo: 1", None);
        assert_eq!(patched, "a\r\n  m_ShowUnitySplashLogo: 0");
    }

    #[test]
    fn already_disabled_splash_is_untouched() {
        assert_eq!(
            patch_line("  m_ShowUnitySplashScreen: 0", None),
            "  m_ShowUnitySplashScreen: 0"
        );
    }

    #[test]
    fn patches_file_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ProjectSettings.asset");
        std::fs::write(&path, SETTINGS).unwrap();

        patch_settings_file(&path, Some("7")).unwrap();

        let patched = std::fs::read_to_string(&path).unwrap();
        assert!(patched.contains("AndroidBundleVersionCode: 7\n"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_settings_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = patch_settings_file(&tmp.path().join("ProjectSettings.asset"), None).unwrap_err();
        assert!(matches!(err, Error::Fs { .. }));
    }
}
