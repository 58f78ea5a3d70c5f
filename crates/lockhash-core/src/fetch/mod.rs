//! Blocking HTTP access used by the indexes (page/JSON GETs) and the fixer (artifact downloads).
//!
//! The rest of the crate only depends on the [`Fetch`] trait; [`CurlFetcher`]
//! is the libcurl-backed implementation used by the CLI.

mod curl_fetcher;

pub use curl_fetcher::CurlFetcher;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A completed HTTP exchange (any status).
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.status == 410
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure reported by the HTTP client (DNS, connect, timeout, TLS...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
    /// Download finished with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    /// Writing the downloaded body to disk failed.
    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Generic HTTP primitive: GET into memory, or stream a download to a file.
pub trait Fetch {
    /// GET `url` and return status and body. Non-2xx statuses are not errors here.
    fn get(&self, url: &str) -> Result<Response, FetchError>;

    /// GET `url` into `dest` (truncating it). Fails on non-2xx status.
    /// Returns the number of bytes written.
    fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}
