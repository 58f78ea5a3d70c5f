//! Package index abstraction: turn a locked `name`+`version` into downloadable links.
//!
//! The fixer only depends on [`PackageIndex`] and [`IndexPool`]; it does not
//! know whether links come from a PEP 503 simple page or the PyPI JSON API.

mod filename;
mod page;
mod pypi;
mod simple;

pub use filename::{canonicalize_name, matches_release};
pub use pypi::PypiIndex;
pub use simple::SimpleIndex;

use crate::fetch::{Fetch, FetchError};
use crate::project::SourceConfig;
use crate::url_model::{filename_from_url_path, without_fragment};
use std::collections::HashMap;
use thiserror::Error;

/// Name Poetry gives the built-in PyPI repository.
pub const PYPI_REPOSITORY_NAME: &str = "PyPI";

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("repository \"{0}\" does not exist")]
    UnknownRepository(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    #[error("invalid index URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A downloadable artifact URL as published by an index (may carry a `#hash=` fragment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Artifact filename: last URL path segment, percent-decoded.
    pub fn filename(&self) -> Option<String> {
        filename_from_url_path(&self.url)
    }

    pub fn url_without_fragment(&self) -> &str {
        without_fragment(&self.url)
    }
}

/// A repository that can list the artifacts of one release.
pub trait PackageIndex {
    /// Repository name as referenced by `package.source.reference` in the lock file.
    fn name(&self) -> &str;

    /// Current links for `name` at exactly `version`. An unknown project or release yields no links.
    fn find_links(
        &self,
        fetch: &dyn Fetch,
        name: &str,
        version: &str,
    ) -> Result<Vec<Link>, IndexError>;
}

/// Named repositories, looked up case-insensitively.
#[derive(Default)]
pub struct IndexPool {
    indexes: Vec<Box<dyn PackageIndex>>,
}

impl IndexPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// PyPI plus one simple repository per configured source that has a URL.
    pub fn from_sources(pypi_url: &str, sources: &[SourceConfig]) -> Result<Self, IndexError> {
        let mut pool = Self::new();
        pool.add(Box::new(PypiIndex::new(PYPI_REPOSITORY_NAME, pypi_url)?));
        for source in sources {
            match &source.url {
                Some(url) => pool.add(Box::new(SimpleIndex::new(&source.name, url)?)),
                None => tracing::warn!("source {} has no url, ignoring it", source.name),
            }
        }
        Ok(pool)
    }

    /// Adds `index`; a later index with the same name shadows the earlier one.
    pub fn add(&mut self, index: Box<dyn PackageIndex>) {
        tracing::debug!("registered repository {}", index.name());
        self.indexes.push(index);
    }

    pub fn repository(&self, name: &str) -> Result<&dyn PackageIndex, IndexError> {
        self.indexes
            .iter()
            .rev()
            .find(|index| index.name().eq_ignore_ascii_case(name))
            .map(|index| index.as_ref())
            .ok_or_else(|| IndexError::UnknownRepository(name.to_string()))
    }
}

/// Artifact filename → download URL (fragment stripped). Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap {
    urls: HashMap<String, String>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, links: impl IntoIterator<Item = Link>) {
        for link in links {
            match link.filename() {
                Some(filename) => {
                    self.urls
                        .insert(filename, link.url_without_fragment().to_string());
                }
                None => tracing::debug!("skipping link without filename: {}", link.url),
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.urls.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
