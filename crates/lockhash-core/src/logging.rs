//! Logging init: stderr, optionally teed into a file under the XDG state dir.

use anyhow::Result;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Writer that copies every line to stderr and, when available, to the log file.
enum StderrOrTee {
    Tee(std::fs::File),
    Stderr,
}

impl Write for StderrOrTee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().lock().write_all(buf)?;
        if let StderrOrTee::Tee(f) = self {
            f.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().lock().flush()?;
        match self {
            StderrOrTee::Tee(f) => f.flush(),
            StderrOrTee::Stderr => Ok(()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Location of the optional log file: `~/.local/state/lockhash/lockhash.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lockhash")?;
    Ok(xdg_dirs.place_state_file("lockhash.log")?)
}

/// Initialize logging to stderr plus an appended log file.
/// On failure (e.g. state dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging_with_file() -> Result<()> {
    let log_file_path = log_file_path()?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    struct TeeMakeWriter(std::fs::File);

    impl<'a> MakeWriter<'a> for TeeMakeWriter {
        type Writer = StderrOrTee;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(StderrOrTee::Tee)
                .unwrap_or(StderrOrTee::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(TeeMakeWriter(file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::debug!("logging to {}", log_file_path.display());

    Ok(())
}

/// Initialize logging to stderr only.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// Pick the logging setup requested by config, falling back to stderr when the file can't be opened.
pub fn init_logging(log_file: bool) {
    if !log_file {
        init_logging_stderr();
        return;
    }
    if let Err(err) = init_logging_with_file() {
        init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}), using stderr", err);
    }
}
