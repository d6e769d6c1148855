//! Shared fixtures: a throwaway Unity project, shell stand-ins for the
//! external tools and a recording registry.

#![allow(dead_code)]

use apk_release_stager::staging::{
    BuildContext, BuildContextBuilder, BuildManifest, ProductSettings, PublishSettings,
    RegistryClient, RegistryVerb, Result, SigningSettings, ToolPaths,
};
use chrono::{Local, TimeZone};
use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::TempDir;

/// Serializes tests that write and then execute scripts, so a concurrent
/// fork never holds a script open for writing (ETXTBSY).
pub static SCRIPT_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

pub const SETTINGS: &str = "PlayerSettings:\n  m_ShowUnitySplashScreen: 1\n  m_ShowUnitySplashLogo: 1\n  AndroidBundleVersionCode: 1\n";

/// Writes an executable `/bin/sh` script.
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Unity stand-in: drops `outputs` next to the requested `outputPath` and
/// records its arguments in `unity-args.txt`.
pub fn unity_writing(dir: &Path, outputs: &[&str]) -> PathBuf {
    let mut body = String::from(
        r#"echo "$@" > "$(pwd)/unity-args.txt"
for a in "$@"; do
  case "$a" in outputPath=*) out="${a#outputPath=}" ;; esac
done
dir=$(dirname "$out")
mkdir -p "$dir"
"#,
    );
    for name in outputs {
        body.push_str(&format!("printf X > \"$dir/{name}\"\n"));
    }
    write_tool(dir, "unity", &body)
}

/// zipalign stand-in: `-p -f -v 4 <in> <out>` copies in to out.
pub fn zipalign(dir: &Path) -> PathBuf {
    write_tool(dir, "zipalign", r#"cp "$5" "$6""#)
}

/// Signer stand-in: copies the input to `--out`, failing for keys whose
/// directory name contains `broken`.
pub fn java(dir: &Path) -> PathBuf {
    write_tool(
        dir,
        "java",
        r#"case "$5" in *sign-apk-broken*) exit 1 ;; esac
cp "${10}" "$9""#,
    )
}

/// Object storage stand-in: appends `<local> <remote>` to `uploads.txt`.
pub fn tosutil(dir: &Path) -> PathBuf {
    write_tool(dir, "tosutil", r#"echo "$2 $3" >> "$(pwd)/uploads.txt""#)
}

/// A Unity project with patchable settings and every tool stubbed.
pub struct Fixture {
    pub root: TempDir,
    pub bin: TempDir,
    pub tools: ToolPaths,
}

impl Fixture {
    pub fn new(unity_outputs: &[&str]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let settings = root.path().join("ProjectSettings");
        std::fs::create_dir_all(&settings).unwrap();
        std::fs::write(settings.join("ProjectSettings.asset"), SETTINGS).unwrap();
        std::fs::write(settings.join("ProjectVersion.txt"), "m_EditorVersion: 2020.3").unwrap();

        let bin = tempfile::tempdir().unwrap();
        let tools = ToolPaths {
            build_tool: unity_writing(bin.path(), unity_outputs),
            zipalign: zipalign(bin.path()),
            java: java(bin.path()),
            apksigner_jar: bin.path().join("apksigner.jar"),
            object_store: tosutil(bin.path()),
        };
        std::fs::write(&tools.apksigner_jar, "jar").unwrap();

        Self { root, bin, tools }
    }

    pub fn product() -> ProductSettings {
        ProductSettings {
            product_name: "Launcher".into(),
            method: "ProjectBuild.BuildForAndroid".into(),
            version: Some("1.3.1".into()),
            version_code: Some("100301001".into()),
            commit_id: "abc123".into(),
            build_tag: "tag-7".into(),
            build_revision: "r1".into(),
            branch: "main".into(),
        }
    }

    pub fn builder(&self, keys: &[&str]) -> BuildContextBuilder {
        BuildContextBuilder::new()
            .product(Self::product())
            .project_root(self.root.path())
            .tools(self.tools.clone())
            .output_channels(vec!["cn".into()])
            .signing(SigningSettings {
                key_ids: keys.iter().map(|k| k.to_string()).collect(),
                key_root: self.root.path().join("keys"),
                ..Default::default()
            })
            .publish(PublishSettings {
                bucket: "tos://bucket".into(),
                ..Default::default()
            })
            .started_at(Local.with_ymd_and_hms(2024, 5, 7, 23, 7, 0).unwrap())
    }

    pub fn context(&self, keys: &[&str]) -> BuildContext {
        self.builder(keys).build().unwrap()
    }

    /// Lines written by the object storage stand-in.
    pub fn uploads(&self) -> Vec<String> {
        std::fs::read_to_string(self.root.path().join("uploads.txt"))
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Registry double answering from a script and recording every request.
pub struct RecordingRegistry {
    answers: Mutex<Vec<u16>>,
    pub requests: Mutex<Vec<(RegistryVerb, BuildManifest)>>,
}

impl RecordingRegistry {
    pub fn answering(answers: &[u16]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().rev().copied().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn verbs(&self) -> Vec<RegistryVerb> {
        self.requests.lock().unwrap().iter().map(|(v, _)| *v).collect()
    }
}

impl RegistryClient for RecordingRegistry {
    async fn send(&self, verb: RegistryVerb, manifest: &BuildManifest) -> Result<u16> {
        self.requests.lock().unwrap().push((verb, manifest.clone()));
        Ok(self.answers.lock().unwrap().pop().unwrap_or(500))
    }
}

impl RegistryClient for &RecordingRegistry {
    async fn send(&self, verb: RegistryVerb, manifest: &BuildManifest) -> Result<u16> {
        (**self).send(verb, manifest).await
    }
}
