//! Logging bootstrap for hosts embedding the selection layer.
//!
//! # Responsibility
//! - Start file-based rolling logs at most once per process.
//! - Record panics as sanitized, single-line log events.
//!
//! # Invariants
//! - Re-initialization with an identical config is a no-op.
//! - Re-initialization with a different level or directory is rejected.
//! - Initialization never panics.

use crate::config::{normalize_level, normalize_log_dir, LoggingConfig, LoggingError};
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "treeselect";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn check_same(&self, level: &'static str, log_dir: &Path) -> Result<(), LoggingError> {
        if self.log_dir != log_dir {
            return Err(LoggingError::Conflict {
                field: "directory",
                active: self.log_dir.display().to_string(),
                requested: log_dir.display().to_string(),
            });
        }
        if self.level != level {
            return Err(LoggingError::Conflict {
                field: "level",
                active: self.level.to_string(),
                requested: level.to_string(),
            });
        }
        Ok(())
    }
}

/// Starts logging for `config`.
///
/// # Errors
/// - `UnsupportedLevel`, `EmptyLogDir`, `RelativeLogDir` for invalid input.
/// - `CreateDir` / `Backend` when the directory or backend cannot be set up.
/// - `Conflict` when logging already runs with another level or directory.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let level = normalize_level(&config.level)?;
    let log_dir = normalize_log_dir(&config.log_dir)?;

    if let Some(active) = ACTIVE_LOGGER.get() {
        return active.check_same(level, &log_dir);
    }

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(level, &log_dir, config))?;
    active.check_same(level, &log_dir)
}

/// Returns `(level, log_dir)` of the active logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

fn start_logger(
    level: &'static str,
    log_dir: &Path,
    config: &LoggingConfig,
) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|err| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        message: err.to_string(),
    })?;

    let duplicate = if config.duplicate_to_stderr {
        Duplicate::All
    } else {
        Duplicate::None
    };

    let handle = Logger::try_with_str(level)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .duplicate_to_stderr(duplicate)
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook_once();

    info!(
        "event=logging_start module=core status=ok platform={} version={} level={} log_dir={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level,
        log_dir.display()
    );

    Ok(ActiveLogger {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = if let Some(message) = panic_info.payload().downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = panic_info.payload().downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        error!(
            "event=panic_captured module=core status=error location={} payload={}",
            location,
            single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

/// Flattens `value` to one line of at most `max_chars` characters.
fn single_line(value: &str, max_chars: usize) -> String {
    let flattened = value.replace(['\n', '\r'], " ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let mut truncated = flattened.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}
