//! Tracing setup for the `ticker` binary.
//!
//! Two layers share one registry:
//! - `ticker.log` in the data directory, always on at INFO, append mode
//! - stderr, off unless `RUST_LOG` holds a valid filter

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside the data directory
pub const LOG_FILE: &str = "ticker.log";

/// Longest `RUST_LOG` value that is parsed
const MAX_FILTER_LEN: usize = 4096;

/// Install the global subscriber. A second call is a no-op.
pub fn init(data_dir: &Path) {
    let file = fmt::layer()
        .with_writer(LogFile::new(data_dir.join(LOG_FILE)))
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);
    let stderr = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(stderr_filter(std::env::var("RUST_LOG").ok().as_deref()));

    let _ = tracing_subscriber::registry()
        .with(file)
        .with(stderr)
        .try_init();
}

/// Invalid or oversized filters turn stderr logging off
fn stderr_filter(raw: Option<&str>) -> EnvFilter {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty() && raw.len() <= MAX_FILTER_LEN)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"))
}

/// Appends to the log file, opening it per event so nothing is created
/// until the first record is written. Open failures drop the record.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self.open() {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::sink()),
        }
    }
}
