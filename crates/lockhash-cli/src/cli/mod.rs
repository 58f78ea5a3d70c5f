//! CLI for lockhash.

use anyhow::Result;
use clap::Parser;
use lockhash_core::config::{self, LockhashConfig};
use lockhash_core::{fixer, logging};
use std::path::PathBuf;

/// Replace legacy MD5 hashes in a Poetry lock file with SHA-256 hashes.
///
/// Artifacts that are still listed by their repository are downloaded and
/// re-hashed; entries whose artifact is gone are removed.
#[derive(Debug, Parser)]
#[command(name = "lockhash", version)]
pub struct Cli {
    /// Project directory (containing pyproject.toml and poetry.lock).
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let (cfg, config_err) = config_or_default(config::load_or_init());
        logging::init_logging(cfg.log_file);
        if let Some(err) = config_err {
            tracing::warn!("config unavailable ({:#}), using defaults", err);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        fixer::fix_project(&cli.project_dir, &cfg)?;
        Ok(())
    }
}

/// Defaults stand in for a config that cannot be read or created.
fn config_or_default(
    loaded: Result<LockhashConfig>,
) -> (LockhashConfig, Option<anyhow::Error>) {
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(err) => (LockhashConfig::default(), Some(err)),
    }
}
