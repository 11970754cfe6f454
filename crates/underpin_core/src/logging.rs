//! Process logging bootstrap for the `log` facade.
//!
//! # Responsibility
//! - Start `flexi_logger` exactly once per process.
//! - Write rotating files when a directory is configured, stderr otherwise.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and destination.
//! - Re-initialization with a different level or destination is rejected.
//! - Initialization never panics.

use crate::config::LoggingConfig;
use crate::error::{CoreError, CoreResult};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "underpin";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: Option<PathBuf>,
    _handle: LoggerHandle,
}

/// Initializes the `log` facade from `config`.
///
/// # Errors
/// - `ValidationFailed` when the level is unsupported or the directory is
///   not absolute.
/// - `OperationFailed` when logging is already active with another level or
///   destination, or when the backend cannot start.
pub fn init_logging(config: &LoggingConfig) -> CoreResult<()> {
    let level = normalize_level(&config.level)?;
    let log_dir = match &config.log_dir {
        Some(dir) => Some(normalize_log_dir(dir)?),
        None => None,
    };

    let state = LOGGING_STATE.get_or_try_init(|| start(level, log_dir.clone()))?;

    if state.log_dir != log_dir {
        return Err(CoreError::operation_failed(
            "init_logging",
            format!(
                "logging already initialized at `{}`; refusing to switch to `{}`",
                describe_destination(state.log_dir.as_deref()),
                describe_destination(log_dir.as_deref())
            ),
        ));
    }
    if state.level != level {
        return Err(CoreError::operation_failed(
            "init_logging",
            format!(
                "logging already initialized with level `{}`; refusing to switch to `{level}`",
                state.level
            ),
        ));
    }
    Ok(())
}

fn start(level: &'static str, log_dir: Option<PathBuf>) -> CoreResult<LoggingState> {
    let failed = |message: String| CoreError::operation_failed("init_logging", message);

    let logger = Logger::try_with_str(level)
        .map_err(|err| failed(format!("invalid log level `{level}`: {err}")))?;

    let logger = match &log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                failed(format!(
                    "failed to create log directory `{}`: {err}",
                    dir.display()
                ))
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
        None => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format),
    };

    let handle = logger
        .start()
        .map_err(|err| failed(format!("failed to start logger: {err}")))?;

    info!(
        "event=core_init module=logging status=ok level={} destination={} version={}",
        level,
        describe_destination(log_dir.as_deref()),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        log_dir,
        _handle: handle,
    })
}

/// Returns `(level, log_dir)` once logging is active.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
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

pub(crate) fn normalize_level(level: &str) -> CoreResult<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(CoreError::validation_failed(
            "logging.level",
            format!("unsupported log level `{other}`; expected trace|debug|info|warn|error"),
        )),
    }
}

fn normalize_log_dir(log_dir: &Path) -> CoreResult<PathBuf> {
    if log_dir.as_os_str().is_empty() {
        return Err(CoreError::validation_failed(
            "logging.log_dir",
            "log_dir cannot be empty",
        ));
    }
    if !log_dir.is_absolute() {
        return Err(CoreError::validation_failed(
            "logging.log_dir",
            format!("log_dir must be an absolute path, got `{}`", log_dir.display()),
        ));
    }
    Ok(log_dir.to_path_buf())
}

fn describe_destination(log_dir: Option<&Path>) -> String {
    match log_dir {
        Some(dir) => dir.display().to_string(),
        None => "stderr".to_string(),
    }
}
