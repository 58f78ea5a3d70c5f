//! Lock file hash fixer: replace legacy MD5 entries with SHA-256 ones.
//!
//! One sequential pass:
//! 1. collect `metadata.files` entries hashed with MD5,
//! 2. ask each referenced repository for the current links of the locked release,
//! 3. download every still-listed artifact, check its MD5, store its SHA-256,
//! 4. drop entries whose artifact is no longer listed,
//! 5. write the lock file back if anything changed.
//!
//! Hash mismatches are logged and left alone. Download and index failures abort the run.

mod links;


pub use links::resolve_links;

use crate::checksum::{self, FileHash};
use crate::config::LockhashConfig;
use crate::fetch::{CurlFetcher, Fetch};
use crate::index::{IndexPool, LinkMap};
use crate::lockfile::{LockFile, PendingUpdate};
use crate::project::Project;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// What a fix pass did, per artifact filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    /// Entries now carrying a `sha256:` hash.
    pub updated: Vec<String>,
    /// Entries removed because no index lists the artifact anymore.
    pub deleted: Vec<String>,
    /// Entries left as-is because the downloaded bytes did not match the stored MD5.
    pub mismatched: Vec<String>,
}

impl FixReport {
    /// True when the lock data differs from what was loaded.
    pub fn changed(&self) -> bool {
        !self.updated.is_empty() || !self.deleted.is_empty()
    }
}

enum Outcome {
    Updated(String),
    Mismatch,
}

/// Download one artifact to a scoped temp file and, if its MD5 matches, return the new hash string.
fn rehash(fetch: &dyn Fetch, url: &str, pending: &PendingUpdate) -> Result<Outcome> {
    let tmp = tempfile::NamedTempFile::new().context("create temp file for download")?;
    fetch
        .download(url, tmp.path())
        .with_context(|| format!("download {}", url))?;

    let md5 = checksum::md5_path(tmp.path())?;
    let stored = FileHash::parse(&pending.entry.hash);
    let matches = stored.is_some_and(|h| h.is_legacy() && h.hex.eq_ignore_ascii_case(&md5));
    if !matches {
        tracing::warn!(
            "{} hash {} does not match actual hash {}",
            pending.entry.file,
            pending.entry.hash,
            md5
        );
        return Ok(Outcome::Mismatch);
    }

    let sha256 = checksum::sha256_path(tmp.path())?;
    Ok(Outcome::Updated(FileHash::sha256(sha256).to_string()))
}

/// Rewrite legacy hashes of `lock` in memory. The caller decides whether to write it.
pub fn fix_lock_hashes(
    lock: &mut LockFile,
    pool: &IndexPool,
    fetch: &dyn Fetch,
) -> Result<FixReport> {
    let pending = lock.legacy_entries()?;
    let mut report = FixReport::default();
    if pending.is_empty() {
        tracing::info!("no MD5 hashes in {}", lock.path().display());
        return Ok(report);
    }

    let links: LinkMap = resolve_links(lock, &pending, pool, fetch)?;

    let mut deletions: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for item in &pending {
        let filename = &item.entry.file;
        tracing::info!("{} has MD5 hash", filename);

        let Some(url) = links.get(filename) else {
            tracing::info!("No link found for {}, deleting from lock file", filename);
            deletions
                .entry(item.package.clone())
                .or_default()
                .push(item.index);
            report.deleted.push(filename.clone());
            continue;
        };

        match rehash(fetch, url, item)? {
            Outcome::Mismatch => report.mismatched.push(filename.clone()),
            Outcome::Updated(hash) => {
                lock.set_hash(&item.package, item.index, &hash)?;
                tracing::info!("{} has been updated for SHA256 hash", filename);
                report.updated.push(filename.clone());
            }
        }
    }

    for (package, indices) in &deletions {
        lock.remove_entries(package, indices)?;
    }

    Ok(report)
}

/// Fix the lock file of the Poetry project in `project_dir`, writing it only when something changed.
pub fn fix_project(project_dir: &Path, cfg: &LockhashConfig) -> Result<FixReport> {
    let project = Project::load(project_dir)?;
    let mut lock = LockFile::load(&project.lock_path())?;
    let pool = IndexPool::from_sources(&cfg.pypi_url, &project.sources)?;
    let fetch = CurlFetcher::new(cfg.http.clone());

    let report = fix_lock_hashes(&mut lock, &pool, &fetch)?;
    if report.changed() {
        tracing::info!("Updating {}", lock.path().display());
        lock.write()?;
    }
    tracing::info!(
        "{} updated, {} deleted, {} mismatched",
        report.updated.len(),
        report.deleted.len(),
        report.mismatched.len()
    );
    Ok(report)
}
