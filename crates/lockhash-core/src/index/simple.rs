//! PEP 503 "simple" repository (Poetry's legacy repository type).

use super::filename::{canonicalize_name, matches_release};
use super::page::anchor_hrefs;
use super::{IndexError, Link, PackageIndex};
use crate::fetch::Fetch;
use url::Url;

/// Lists artifacts from `<base>/<normalized-name>/`.
#[derive(Debug, Clone)]
pub struct SimpleIndex {
    name: String,
    base: Url,
}

impl SimpleIndex {
    pub fn new(name: &str, url: &str) -> Result<Self, IndexError> {
        let mut base = Url::parse(url).map_err(|source| IndexError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            name: name.to_string(),
            base,
        })
    }

    pub fn page_url(&self, project: &str) -> Result<Url, IndexError> {
        let relative = format!("{}/", canonicalize_name(project));
        self.base
            .join(&relative)
            .map_err(|source| IndexError::InvalidUrl {
                url: format!("{}{}", self.base, relative),
                source,
            })
    }
}

impl PackageIndex for SimpleIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_links(
        &self,
        fetch: &dyn Fetch,
        name: &str,
        version: &str,
    ) -> Result<Vec<Link>, IndexError> {
        let page_url = self.page_url(name)?;
        let response = fetch.get(page_url.as_str())?;
        if response.is_not_found() {
            tracing::debug!("{} has no page for {}", self.name, name);
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(IndexError::Http {
                url: page_url.to_string(),
                status: response.status,
            });
        }

        let html = String::from_utf8_lossy(&response.body);
        let links = anchor_hrefs(&html)
            .into_iter()
            .filter_map(|href| match page_url.join(&href) {
                Ok(url) => Some(Link::new(url)),
                Err(e) => {
                    tracing::debug!("skipping unresolvable link {}: {}", href, e);
                    None
                }
            })
            .filter(|link| {
                link.filename()
                    .is_some_and(|f| matches_release(&f, name, version))
            })
            .collect();
        Ok(links)
    }
}
