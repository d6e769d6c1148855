//! Signing key configuration.

use std::path::PathBuf;

/// Default directory holding one `sign-apk-<id>` folder per key identity.
pub const DEFAULT_KEY_ROOT: &str = "/mnt/ota-base/.code/jenkins/sign-apk";

/// Default key type, the file stem of the key/certificate pair.
pub const DEFAULT_KEY_TYPE: &str = "platform";

/// Key identities and where their key material lives.
#[derive(Debug, Clone)]
pub struct SigningSettings {
    /// Key identities in configured order. Empty entries are never stored.
    pub key_ids: Vec<String>,

    /// Key type, e.g. `platform` or `releasekey`.
    pub key_type: String,

    /// Root directory of the key store.
    pub key_root: PathBuf,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            key_ids: Vec::new(),
            key_type: DEFAULT_KEY_TYPE.to_string(),
            key_root: PathBuf::from(DEFAULT_KEY_ROOT),
        }
    }
}

/// Private key and certificate used for one signing identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// PKCS#8 private key.
    pub key: PathBuf,
    /// X.509 PEM certificate.
    pub cert: PathBuf,
}

impl SigningSettings {
    /// Resolves the key pair for `key_id`:
    /// `<root>/sign-apk-<id>/<type>.pk8` and `<type>.x509.pem`.
    pub fn key_pair(&self, key_id: &str) -> KeyPair {
        let dir = self.key_root.join(format!("sign-apk-{key_id}"));
        KeyPair {
            key: dir.join(format!("{}.pk8", self.key_type)),
            cert: dir.join(format!("{}.x509.pem", self.key_type)),
        }
    }
}
