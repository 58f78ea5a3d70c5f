//! libcurl-backed [`Fetch`] implementation (one easy handle per request).

use super::{Fetch, FetchError, Response};
use crate::config::HttpConfig;
use curl::easy::Easy;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const MAX_REDIRECTIONS: u32 = 10;

/// Runs requests on the current thread; redirects are followed.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    http: HttpConfig,
}

impl CurlFetcher {
    pub fn new(http: HttpConfig) -> Self {
        Self { http }
    }

    fn easy(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTIONS)?;
        easy.connect_timeout(self.http.connect_timeout())?;
        easy.timeout(self.http.timeout())?;
        easy.useragent(&self.http.user_agent)?;
        Ok(easy)
    }
}

fn transport(url: &str) -> impl FnOnce(curl::Error) -> FetchError + '_ {
    move |source| FetchError::Transport {
        url: url.to_string(),
        source,
    }
}

impl Fetch for CurlFetcher {
    fn get(&self, url: &str) -> Result<Response, FetchError> {
        let mut body = Vec::new();
        let mut easy = self.easy(url).map_err(transport(url))?;
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(transport(url))?;
            transfer.perform().map_err(transport(url))?;
        }
        let status = easy.response_code().map_err(transport(url))?;
        tracing::debug!("GET {} -> HTTP {} ({} bytes)", url, status, body.len());
        Ok(Response { status, body })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let io_err = |source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };
        let mut file = File::create(dest).map_err(io_err)?;
        let mut written: u64 = 0;
        let mut write_failure: Option<std::io::Error> = None;

        let mut easy = self.easy(url).map_err(transport(url))?;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match file.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_failure = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(transport(url))?;
            transfer.perform()
        };
        if let Some(e) = write_failure {
            return Err(io_err(e));
        }
        performed.map_err(transport(url))?;

        let status = easy.response_code().map_err(transport(url))?;
        if !(200..300).contains(&status) {
            return Err(FetchError::Http {
                url: url.to_string(),
                status,
            });
        }
        file.flush().map_err(io_err)?;
        tracing::debug!("downloaded {} ({} bytes) to {}", url, written, dest.display());
        Ok(written)
    }
}
