//! Artifact checksums and the `"<algorithm>:<hex>"` hash strings stored in lock files.
//!
//! Digests are computed from a file on disk in fixed-size chunks so large
//! wheels never have to be held in memory at once.

use anyhow::{Context, Result};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Hash algorithms that appear in lock file entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// Legacy algorithm, replaced wherever the artifact can still be fetched.
    Md5,
    Sha256,
    /// Anything else is carried through untouched.
    Other(String),
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Other(name) => name,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "md5" => HashAlgorithm::Md5,
            "sha256" => HashAlgorithm::Sha256,
            other => HashAlgorithm::Other(other.to_string()),
        }
    }
}

/// A parsed lock file hash such as `sha256:e3b0c442...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHash {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl FileHash {
    /// Splits `"<algorithm>:<hex>"`. Returns `None` when there is no `:` separator.
    pub fn parse(value: &str) -> Option<Self> {
        let (algorithm, hex) = value.split_once(':')?;
        Some(Self {
            algorithm: HashAlgorithm::from_name(algorithm),
            hex: hex.to_string(),
        })
    }

    pub fn sha256(hex: impl Into<String>) -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            hex: hex.into(),
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.algorithm == HashAlgorithm::Md5
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm.as_str(), self.hex)
    }
}

fn digest_path<D: Digest>(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute MD5 of a file and return the digest as lowercase hex.
pub fn md5_path(path: &Path) -> Result<String> {
    digest_path::<Md5>(path)
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    digest_path::<Sha256>(path)
}
