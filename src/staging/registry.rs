//! Build registry manifest and client.
//!
//! The manifest is POSTed first; any answer other than 200 is followed by a
//! single PUT of the same body, an upsert attempt rather than a retry loop.
//! A rejection after the PUT is reported but never aborts the run.

use crate::staging::{BuildContext, error::Result};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Identity reported as the manifest's `builder`.
pub const BUILDER_IDENTITY: &str = "cmbuild";

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

fn deserialize_flag<'de, D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(u8::deserialize(deserializer)? != 0)
}

/// One uploaded file as recorded in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    /// Size in bytes.
    pub size: u64,
    /// `%Y-%m-%d %H:%M:%S`, taken when the record was built.
    pub create_time: String,
    /// Content digest, lowercase hex.
    pub digest: String,
    /// Object key below the bucket.
    pub tos_key: String,
    /// File name.
    pub name: String,
    /// Serialized as `1`/`0`.
    #[serde(serialize_with = "serialize_flag", deserialize_with = "deserialize_flag")]
    pub uploaded: bool,
}

/// Manifest describing one completed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildManifest {
    pub product: String,
    pub delete_file: bool,
    pub project: String,
    pub repo: String,
    #[serde(serialize_with = "serialize_flag", deserialize_with = "deserialize_flag")]
    pub uploaded: bool,
    pub version: String,
    pub branch: String,
    pub build_revision: String,
    pub build_tag: String,
    pub build_time: String,
    pub builder: String,
    pub files: BTreeMap<String, ArtifactRecord>,
}

impl BuildManifest {
    /// Wraps `files` with the run-level metadata of `context`.
    pub fn new(context: &BuildContext, files: BTreeMap<String, ArtifactRecord>) -> Self {
        let product = context.product();
        Self {
            product: product.product_name.clone(),
            delete_file: false,
            project: context.publish().project.clone(),
            repo: context.publish().repo.clone(),
            uploaded: true,
            version: product.version.clone().unwrap_or_default(),
            branch: product.branch.clone(),
            build_revision: product.build_revision.clone(),
            build_tag: product.build_tag.clone(),
            build_time: context.build_time(),
            builder: BUILDER_IDENTITY.to_string(),
            files,
        }
    }
}

/// HTTP verb used against the registry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryVerb {
    Post,
    Put,
}

/// Sends manifests to the build registry.
#[allow(async_fn_in_trait)]
pub trait RegistryClient {
    /// Sends `manifest` with `verb` and returns the HTTP status code.
    async fn send(&self, verb: RegistryVerb, manifest: &BuildManifest) -> Result<u16>;
}

/// [`RegistryClient`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRegistry {
    /// Creates a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint receiving the manifest.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RegistryClient for HttpRegistry {
    async fn send(&self, verb: RegistryVerb, manifest: &BuildManifest) -> Result<u16> {
        let request = match verb {
            RegistryVerb::Post => self.client.post(&self.endpoint),
            RegistryVerb::Put => self.client.put(&self.endpoint),
        };
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .json(manifest)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        log::debug!("registry {verb:?} -> {status}: {body}");
        Ok(status)
    }
}

/// How the registry answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryOutcome {
    /// Accepted with 200 on the given verb.
    Accepted(RegistryVerb),
    /// Neither POST nor PUT returned 200.
    Rejected {
        /// What the POST returned.
        post: String,
        /// What the PUT returned.
        put: String,
    },
}

fn describe(result: &Result<u16>) -> String {
    match result {
        Ok(code) => format!("HTTP {code}"),
        Err(e) => e.to_string(),
    }
}

/// POSTs `manifest`, falling back to one PUT when the POST is not answered
/// with 200. Never fails: the outcome is returned for the caller to log.
pub async fn submit_manifest<R: RegistryClient>(
    registry: &R,
    manifest: &BuildManifest,
) -> RegistryOutcome {
    let post = registry.send(RegistryVerb::Post, manifest).await;
    if matches!(post, Ok(200)) {
        log::info!("✓ Registry accepted manifest");
        return RegistryOutcome::Accepted(RegistryVerb::Post);
    }
    log::warn!("registry POST answered {}, retrying with PUT", describe(&post));

    let put = registry.send(RegistryVerb::Put, manifest).await;
    if matches!(put, Ok(200)) {
        log::info!("✓ Registry accepted manifest via PUT");
        return RegistryOutcome::Accepted(RegistryVerb::Put);
    }

    log::error!("upload pdm file FAILED: {}", describe(&put));
    RegistryOutcome::Rejected {
        post: describe(&post),
        put: describe(&put),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        answers: Mutex<Vec<u16>>,
        seen: Mutex<Vec<RegistryVerb>>,
    }

    impl Scripted {
        fn new(answers: &[u16]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().copied().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl RegistryClient for Scripted {
        async fn send(&self, verb: RegistryVerb, _: &BuildManifest) -> Result<u16> {
            self.seen.lock().unwrap().push(verb);
            Ok(self.answers.lock().unwrap().pop().unwrap_or(500))
        }
    }

    fn manifest() -> BuildManifest {
        BuildManifest {
            product: "Launcher".into(),
            delete_file: false,
            project: "PUI".into(),
            repo: "daily-build".into(),
            uploaded: true,
            version: "1.0".into(),
            branch: "main".into(),
            build_revision: "r1".into(),
            build_tag: "t1".into(),
            build_time: "2024-05-07 23:07:00".into(),
            builder: BUILDER_IDENTITY.into(),
            files: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn post_success_skips_put() {
        let registry = Scripted::new(&[200]);
        let outcome = submit_manifest(&registry, &manifest()).await;
        assert_eq!(outcome, RegistryOutcome::Accepted(RegistryVerb::Post));
        assert_eq!(*registry.seen.lock().unwrap(), [RegistryVerb::Post]);
    }

    #[tokio::test]
    async fn post_500_falls_back_to_put() {
        let registry = Scripted::new(&[500, 200]);
        let outcome = submit_manifest(&registry, &manifest()).await;
        assert_eq!(outcome, RegistryOutcome::Accepted(RegistryVerb::Put));
        assert_eq!(
            *registry.seen.lock().unwrap(),
            [RegistryVerb::Post, RegistryVerb::Put]
        );
    }

    #[tokio::test]
    async fn double_rejection_is_reported_not_raised() {
        let registry = Scripted::new(&[500, 409]);
        let outcome = submit_manifest(&registry, &manifest()).await;
        assert_eq!(
            outcome,
            RegistryOutcome::Rejected {
                post: "HTTP 500".into(),
                put: "HTTP 409".into()
            }
        );
    }

    #[test]
    fn manifest_serializes_with_registry_field_names() {
        let mut m = manifest();
        m.files.insert(
            "a.apk".into(),
            ArtifactRecord {
                size: 1,
                create_time: "2024-05-07 23:07:01".into(),
                digest: "02129bb861061d1a052c592e2dc6b383".into(),
                tos_key: "app/Launcher/r1/BuildForAndroid/app/a.apk".into(),
                name: "a.apk".into(),
                uploaded: true,
            },
        );
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["deleteFile"], false);
        assert_eq!(json["uploaded"], 1);
        assert_eq!(json["buildRevision"], "r1");
        assert_eq!(json["buildTag"], "t1");
        assert_eq!(json["builder"], "cmbuild");
        assert_eq!(json["files"]["a.apk"]["tosKey"], "app/Launcher/r1/BuildForAndroid/app/a.apk");
        assert_eq!(json["files"]["a.apk"]["createTime"], "2024-05-07 23:07:01");
        assert_eq!(json["files"]["a.apk"]["uploaded"], 1);

        let back: BuildManifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}
