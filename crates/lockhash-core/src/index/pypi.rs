//! PyPI JSON API (`/pypi/<name>/<version>/json`).

use super::filename::canonicalize_name;
use super::{IndexError, Link, PackageIndex};
use crate::fetch::Fetch;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    #[serde(default)]
    urls: Vec<ReleaseFile>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    url: String,
}

#[derive(Debug, Clone)]
pub struct PypiIndex {
    name: String,
    base: Url,
}

impl PypiIndex {
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

    pub fn release_url(&self, project: &str, version: &str) -> Result<Url, IndexError> {
        let relative = format!("pypi/{}/{}/json", canonicalize_name(project), version);
        self.base
            .join(&relative)
            .map_err(|source| IndexError::InvalidUrl {
                url: format!("{}{}", self.base, relative),
                source,
            })
    }
}

impl PackageIndex for PypiIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn find_links(
        &self,
        fetch: &dyn Fetch,
        name: &str,
        version: &str,
    ) -> Result<Vec<Link>, IndexError> {
        let url = self.release_url(name, version)?;
        let response = fetch.get(url.as_str())?;
        if response.is_not_found() {
            tracing::debug!("{} has no release {} {}", self.name, name, version);
            return Ok(Vec::new());
        }
        if !response.is_success() {
            return Err(IndexError::Http {
                url: url.to_string(),
                status: response.status,
            });
        }
        let info: ReleaseInfo =
            serde_json::from_slice(&response.body).map_err(|source| IndexError::Json {
                url: url.to_string(),
                source,
            })?;
        Ok(info.urls.into_iter().map(|f| Link::new(f.url)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, Response};
    use std::path::Path;

    struct Json(u32, &'static str);

    impl Fetch for Json {
        fn get(&self, url: &str) -> Result<Response, FetchError> {
            assert_eq!(url, "https://pypi.org/pypi/typing-extensions/4.0.1/json");
            Ok(Response {
                status: self.0,
                body: self.1.as_bytes().to_vec(),
            })
        }

        fn download(&self, _: &str, _: &Path) -> Result<u64, FetchError> {
            unreachable!("release metadata is never downloaded to disk")
        }
    }

    fn index() -> PypiIndex {
        PypiIndex::new("PyPI", "https://pypi.org").unwrap()
    }

    #[test]
    fn release_urls_become_links() {
        let body = r#"{
            "info": {"name": "typing_extensions"},
            "urls": [
                {"filename": "typing_extensions-4.0.1-py3-none-any.whl",
                 "url": "https://files.pythonhosted.org/packages/aa/typing_extensions-4.0.1-py3-none-any.whl"},
                {"filename": "typing_extensions-4.0.1.tar.gz",
                 "url": "https://files.pythonhosted.org/packages/bb/typing_extensions-4.0.1.tar.gz"}
            ]
        }"#;
        let links = index()
            .find_links(&Json(200, body), "typing_extensions", "4.0.1")
            .unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[1].filename().as_deref(),
            Some("typing_extensions-4.0.1.tar.gz")
        );
    }

    #[test]
    fn unknown_release_yields_no_links() {
        let links = index()
            .find_links(&Json(404, "{\"message\": \"Not Found\"}"), "typing-extensions", "4.0.1")
            .unwrap();
        assert!(links.is_empty());
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(matches!(
            index().find_links(&Json(200, "<html>"), "typing-extensions", "4.0.1"),
            Err(IndexError::Json { .. })
        ));
    }
}
