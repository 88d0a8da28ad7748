//! Rolling file logs and log-line hygiene.
//!
//! # Responsibility
//! - Start the flexi_logger backend once per process.
//! - Capture panics as `panic_captured` events.
//! - Flatten user-controlled values before they reach a key=value line.
//!
//! # Invariants
//! - A repeated call with the same level and directory is a no-op.
//! - A call with a different level or directory after startup is rejected.
//! - Nothing in this module panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

const FILE_BASENAME: &str = "crewboard";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_FILES: usize = 5;
const PANIC_TEXT_LIMIT: usize = 160;
const FIELD_TEXT_LIMIT: usize = 80;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogConfig {
    level: &'static str,
    dir: PathBuf,
}

impl LogConfig {
    fn parse(level: &str, dir: &Path) -> Result<Self, LoggingError> {
        Ok(Self {
            level: parse_level(level)?,
            dir: check_dir(dir)?,
        })
    }

    fn conflict_with(&self, requested: &Self) -> Option<LoggingError> {
        if self.dir != requested.dir {
            return Some(LoggingError::Conflict {
                setting: "directory",
                active: self.dir.display().to_string(),
                requested: requested.dir.display().to_string(),
            });
        }
        (self.level != requested.level).then(|| LoggingError::Conflict {
            setting: "level",
            active: self.level.to_string(),
            requested: requested.level.to_string(),
        })
    }
}

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

/// Logging bootstrap failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    Conflict {
        setting: &'static str,
        active: String,
        requested: String,
    },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "log level `{level}` is not one of trace|debug|info|warn|error")
            }
            Self::InvalidDirectory(message) => write!(f, "invalid log directory: {message}"),
            Self::Conflict {
                setting,
                active,
                requested,
            } => write!(
                f,
                "logging is already running with {setting} `{active}`; refusing to switch to `{requested}`"
            ),
            Self::Backend(message) => write!(f, "log backend failed to start: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging under `log_dir` at `level`.
///
/// # Errors
/// - `level` is not one of trace|debug|info|warn|error.
/// - `log_dir` is empty, relative, or cannot be created.
/// - Logging already runs with another level or directory.
/// - The backend fails to start.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let requested = LogConfig::parse(level, log_dir.as_ref())?;
    let active = ACTIVE.get_or_try_init(|| start_backend(requested.clone()))?;
    match active.config.conflict_with(&requested) {
        Some(conflict) => Err(conflict),
        None => Ok(()),
    }
}

/// Returns `(level, log_dir)` once logging is active.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.config.level, active.config.dir.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Flattens and truncates a user-controlled value (names, links) before it is
/// written into a key=value log line.
pub fn log_value(value: &str) -> String {
    single_line(value, FIELD_TEXT_LIMIT).replace(' ', "_")
}

fn start_backend(config: LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|err| {
        LoggingError::InvalidDirectory(format!("cannot create `{}`: {err}", config.dir.display()))
    })?;

    let handle = Logger::try_with_str(config.level)
        .and_then(|logger| {
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(&config.dir)
                        .basename(FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(ROTATE_AT_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(KEEP_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        })
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    if PANIC_HOOK.set(()).is_ok() {
        install_panic_hook();
    }

    info!(
        "event=app_start module=core status=ok platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=core_init module=core status=ok level={} log_dir={}",
        config.level,
        config.dir.display()
    );

    Ok(ActiveLogger {
        config,
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    let lowered = level.trim().to_ascii_lowercase();
    let wanted = if lowered == "warning" { "warn" } else { lowered.as_str() };
    LEVELS
        .into_iter()
        .find(|known| *known == wanted)
        .ok_or(LoggingError::UnsupportedLevel(lowered))
}

fn check_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    if dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidDirectory("path is empty".to_string()));
    }
    if dir.is_relative() {
        return Err(LoggingError::InvalidDirectory(format!(
            "`{}` is not absolute",
            dir.display()
        )));
    }
    Ok(dir.to_path_buf())
}

fn install_panic_hook() {
    let chained = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            panic_text(info)
        );
        chained(info);
    }));
}

fn panic_text(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let raw = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    single_line(raw, PANIC_TEXT_LIMIT)
}

/// Replaces line breaks with spaces and caps the result at `limit` chars,
/// appending `...` when something was cut.
fn single_line(value: &str, limit: usize) -> String {
    let mut chars = value
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch });
    let mut out: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        out.push_str("...");
    }
    out
}
