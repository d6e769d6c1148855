//! Artifact digest calculation.
//!
//! Digests are streamed in 8KB chunks and rendered as lowercase hex.

use crate::staging::error::{Error, ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::{fmt, path::Path, str::FromStr};
use tokio::io::AsyncReadExt;

/// Hash recorded as an artifact's digest.
///
/// The registry historically stores MD5, which stays the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestAlgorithm {
    /// 32 hex characters.
    #[default]
    Md5,
    /// 64 hex characters.
    Sha256,
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(Error::Config(format!(
                "unknown digest algorithm `{other}`, expected md5 or sha256"
            ))),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        })
    }
}

enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Self::Md5(md5::Context::new()),
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(ctx) => ctx.consume(data),
            Self::Sha256(hasher) => hasher.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Md5(ctx) => format!("{:x}", ctx.finalize()),
            Self::Sha256(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

/// Calculates the digest of a single file.
///
/// # Returns
///
/// * `Ok(String)` - Lowercase hex digest
/// * `Err` - If the file cannot be opened or read
pub async fn calculate_digest(file_path: &Path, algorithm: DigestAlgorithm) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening file for hashing", file_path)?;
    let mut hasher = Hasher::new(algorithm);
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finish())
}
