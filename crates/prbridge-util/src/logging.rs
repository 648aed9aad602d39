use chrono::Local;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Unknown names fall back to `Info`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" | "TRACE" => LogLevel::Debug,
            "INFO" => LogLevel::Info,
            "WARN" | "WARNING" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Keeps the non-blocking file writer alive. Buffered lines are flushed when
/// this is dropped, so hold it for the life of the process.
pub struct LogGuard {
    path: Option<PathBuf>,
    _worker: Option<WorkerGuard>,
}

impl LogGuard {
    /// The log file, when logging goes to disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// `RUST_LOG` wins; otherwise `level`, otherwise `info`.
fn build_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.map(LogLevel::parse).unwrap_or(LogLevel::Info);
        EnvFilter::new(level.as_filter())
    })
}

fn log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%dT%H%M%S").to_string();
    log_dir.join(format!("{}.log", timestamp))
}

/// Installs the global subscriber. With `print` set, events go to stderr;
/// otherwise to a timestamped file under `log_dir` (default `.`). A second
/// call leaves the first subscriber in place.
pub fn init_tracing(level: Option<&str>, log_dir: Option<PathBuf>, print: bool) -> LogGuard {
    let filter = build_filter(level);

    if print {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
        return LogGuard {
            path: None,
            _worker: None,
        };
    }

    let log_dir = log_dir.unwrap_or_else(|| PathBuf::from("."));
    let log_path = log_file_path(&log_dir);

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .ok();

    let Some(file) = file else {
        return LogGuard {
            path: None,
            _worker: None,
        };
    };

    let (non_blocking, worker) = tracing_appender::non_blocking(file);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init();
    tracing::info!(path = %log_path.display(), "logging to file");

    LogGuard {
        path: Some(log_path),
        _worker: Some(worker),
    }
}
