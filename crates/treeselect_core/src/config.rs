//! Runtime configuration for hosts embedding the selection layer.
//!
//! # Responsibility
//! - Describe logging configuration in one validated value.
//! - Normalize user-provided level and directory inputs.
//!
//! # Invariants
//! - A normalized level is one of `trace|debug|info|warn|error`.
//! - A normalized log directory is absolute.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Errors from logging configuration and bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// Level string is not a supported level name.
    UnsupportedLevel(String),
    /// Log directory is empty.
    EmptyLogDir,
    /// Log directory is not absolute.
    RelativeLogDir(PathBuf),
    /// Log directory could not be created.
    CreateDir { path: PathBuf, message: String },
    /// Logger backend rejected the configuration.
    Backend(String),
    /// Logging is already active with a different setting.
    Conflict {
        field: &'static str,
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyLogDir => write!(f, "log_dir cannot be empty"),
            Self::RelativeLogDir(path) => {
                write!(f, "log_dir must be an absolute path, got `{}`", path.display())
            }
            Self::CreateDir { path, message } => write!(
                f,
                "failed to create log directory `{}`: {message}",
                path.display()
            ),
            Self::Backend(message) => write!(f, "failed to start logger: {message}"),
            Self::Conflict {
                field,
                active,
                requested,
            } => write!(
                f,
                "logging already initialized with {field} `{active}`; refusing to switch to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {}

/// Logging setup requested by a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level name, case-insensitive. `warning` is accepted for `warn`.
    pub level: String,
    /// Absolute directory receiving rotated log files.
    pub log_dir: PathBuf,
    /// Also echo records to stderr.
    pub duplicate_to_stderr: bool,
}

impl LoggingConfig {
    /// Creates a config for `log_dir` using the build-mode default level.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: log_dir.into(),
            duplicate_to_stderr: false,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_stderr(mut self, duplicate_to_stderr: bool) -> Self {
        self.duplicate_to_stderr = duplicate_to_stderr;
        self
    }
}

/// Returns the default log level for current build mode.
///
/// - `debug` builds -> `debug`
/// - `release` builds -> `info`
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

pub(crate) fn normalize_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    let raw = log_dir.to_string_lossy();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::EmptyLogDir);
    }
    let path = PathBuf::from(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::RelativeLogDir(path));
    }
    Ok(path)
}
