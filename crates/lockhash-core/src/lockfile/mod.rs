//! Poetry lock file (`poetry.lock`) access.
//!
//! The document is kept as a format-preserving [`toml_edit::DocumentMut`] so
//! that rewriting one hash leaves every other byte of the file as it was.
//! Only the `[metadata.files]` table and the `[[package]]` array are read.

mod edit;
mod scan;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml_edit::DocumentMut;

/// Default lock file name inside a project directory.
pub const LOCK_FILE_NAME: &str = "poetry.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },
    #[error("malformed lock file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("writing {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One `{file = ..., hash = ...}` entry from `metadata.files.<package>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file: String,
    pub hash: String,
}

/// A legacy-hash entry awaiting resolution: package key, position in its list, and the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    pub package: String,
    pub index: usize,
    pub entry: FileEntry,
}

/// `[package.source]` of a locked package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSource {
    pub kind: Option<String>,
    pub url: Option<String>,
    pub reference: Option<String>,
}

/// One `[[package]]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    pub name: String,
    pub version: String,
    pub source: Option<PackageSource>,
}

/// Lock data loaded from disk, edited in place and written back wholesale.
#[derive(Debug, Clone)]
pub struct LockFile {
    path: PathBuf,
    doc: DocumentMut,
}

impl LockFile {
    /// Read and parse the lock file at `path`.
    pub fn load(path: &Path) -> Result<Self, LockError> {
        let text = fs::read_to_string(path).map_err(|source| LockError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse lock data that claims to live at `path` (used for error messages and `write`).
    pub fn parse(path: &Path, text: &str) -> Result<Self, LockError> {
        let doc = text.parse::<DocumentMut>().map_err(|source| LockError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn malformed(&self, reason: impl Into<String>) -> LockError {
        LockError::Malformed {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for LockFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.doc)
    }
}
