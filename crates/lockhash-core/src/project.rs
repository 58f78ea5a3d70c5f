//! Poetry project discovery: `pyproject.toml` sources and the lock file next to it.

use crate::lockfile::LOCK_FILE_NAME;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("could not find {} in {}", PYPROJECT_FILE_NAME, .dir.display())]
    MissingPyproject { dir: PathBuf },
    #[error("could not find {} in {}", LOCK_FILE_NAME, .dir.display())]
    MissingLock { dir: PathBuf },
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
        source: toml::de::Error,
    },
}

/// A `[[tool.poetry.source]]` entry: a named package index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Debug, Default, Deserialize)]
struct Tool {
    #[serde(default)]
    poetry: Poetry,
}

#[derive(Debug, Default, Deserialize)]
struct Poetry {
    #[serde(default)]
    source: Vec<SourceConfig>,
}

/// A Poetry project directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub dir: PathBuf,
    pub sources: Vec<SourceConfig>,
}

impl Project {
    /// Read `<dir>/pyproject.toml`; both it and `<dir>/poetry.lock` must exist.
    pub fn load(dir: &Path) -> Result<Self, ProjectError> {
        let pyproject_path = dir.join(PYPROJECT_FILE_NAME);
        if !pyproject_path.is_file() {
            return Err(ProjectError::MissingPyproject {
                dir: dir.to_path_buf(),
            });
        }
        if !dir.join(LOCK_FILE_NAME).is_file() {
            return Err(ProjectError::MissingLock {
                dir: dir.to_path_buf(),
            });
        }

        let text = fs::read_to_string(&pyproject_path).map_err(|source| ProjectError::Read {
            path: pyproject_path.clone(),
            source,
        })?;
        let pyproject: PyProject = toml::from_str(&text).map_err(|source| ProjectError::Parse {
            path: pyproject_path.clone(),
            source,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
            sources: pyproject.tool.poetry.source,
        })
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE_NAME)
    }
}
