//! Build the filename → URL map for every locked release that has legacy hashes.

use crate::fetch::Fetch;
use crate::index::{IndexPool, LinkMap};
use crate::lockfile::{LockFile, LockedPackage, PendingUpdate};
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Source type Poetry records for packages locked from a named index.
const INDEX_SOURCE_TYPE: &str = "legacy";

/// Name of the repository a package was locked from, if it came from an index.
fn index_reference(package: &LockedPackage) -> Option<&str> {
    let source = package.source.as_ref()?;
    if let Some(kind) = source.kind.as_deref() {
        if kind != INDEX_SOURCE_TYPE {
            tracing::debug!(
                "{} {} comes from a {} source, no index to ask",
                package.name,
                package.version,
                kind
            );
            return None;
        }
    }
    source.reference.as_deref().filter(|r| !r.is_empty())
}

/// Query the referenced repository of each affected package and merge all links.
/// Packages without a source reference contribute nothing.
pub fn resolve_links(
    lock: &LockFile,
    pending: &[PendingUpdate],
    pool: &IndexPool,
    fetch: &dyn Fetch,
) -> Result<LinkMap> {
    let affected: HashSet<&str> = pending.iter().map(|p| p.package.as_str()).collect();
    let mut links = LinkMap::new();

    for package in lock.packages()? {
        if !affected.contains(package.name.as_str()) {
            continue;
        }
        let Some(reference) = index_reference(&package) else {
            continue;
        };
        let repository = pool.repository(reference)?;
        tracing::info!("Getting links for {} {}", package.name, package.version);
        if let Some(url) = package.source.as_ref().and_then(|s| s.url.as_deref()) {
            tracing::debug!("{} was locked from {} ({})", package.name, reference, url);
        }
        let found = repository
            .find_links(fetch, &package.name, &package.version)
            .with_context(|| {
                format!(
                    "resolve links for {} {} from {}",
                    package.name,
                    package.version,
                    repository.name()
                )
            })?;
        tracing::debug!("{} links for {} {}", found.len(), package.name, package.version);
        links.merge(found);
    }
    Ok(links)
}
