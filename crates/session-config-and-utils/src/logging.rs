//! Logging initialization.
//!
//! Every process writes structured JSONL to a single append-only file
//! (`~/.authsession/logs/session.jsonl` by default), optionally mirrored to
//! stderr in a compact human format. Levels come from `RUST_LOG` when set,
//! otherwise from the configured default.

use crate::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Name of the process, written once on startup.
    pub service_name: String,
    /// Level name used when `RUST_LOG` is unset. Unknown names mean `info`.
    pub default_level: String,
    /// JSONL output file.
    pub log_path: PathBuf,
    /// Mirror logs to stderr.
    pub also_stderr: bool,
}

/// Append-only writer flushed after every line so concurrent processes
/// never interleave partial records.
#[derive(Clone)]
struct LineFlushWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl LineFlushWriter {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for LineFlushWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for LineFlushWriter {
    type Writer = LineFlushWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(parse_level(default_level)).into())
        .from_env_lossy()
}

/// Install the global tracing subscriber.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_logging(settings: &LogSettings) -> CoreResult<()> {
    let writer = LineFlushWriter::open(&settings.log_path)?;

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_current_span(false)
        .with_writer(writer)
        .with_filter(env_filter(&settings.default_level));

    let stderr_layer = settings.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&settings.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Config(format!("Failed to install log subscriber: {}", e)))?;

    tracing::info!(
        service = %settings.service_name,
        log_path = %settings.log_path.display(),
        "logging initialized"
    );

    Ok(())
}

/// Parse a log level string into a tracing Level.
fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
