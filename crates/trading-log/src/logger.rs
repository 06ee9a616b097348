//! Named logger with a console handler and at most one file handler.

use anyhow::{bail, Context, Result};
use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::level::LogLevel;
use crate::sink::LogSink;

/// Name of the logger built by [`setup_logging`].
pub const RUNTIME_LOGGER: &str = "runtime";

/// Renders `"<timestamp> - <LEVEL> - <message>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormatter {
    timestamp_format: String,
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            timestamp_format: "%Y-%m-%d %H:%M:%S,%3f".to_string(),
        }
    }
}

impl LineFormatter {
    pub fn with_timestamp_format(format: impl Into<String>) -> Self {
        Self {
            timestamp_format: format.into(),
        }
    }

    pub fn format(&self, level: LogLevel, message: &str) -> String {
        format!(
            "{} - {} - {}",
            Local::now().format(&self.timestamp_format),
            level,
            message
        )
    }
}

#[derive(Debug)]
struct FileHandler {
    path: PathBuf,
    level: LogLevel,
    file: File,
    identity: Option<(u64, u64)>,
}

impl FileHandler {
    fn open(path: &Path, level: LogLevel) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let identity = file.metadata().ok().and_then(|meta| file_identity(&meta));
        Ok(Self {
            path: path.to_path_buf(),
            level,
            file,
            identity,
        })
    }

    /// The path no longer names the open file (rotated or deleted).
    fn is_stale(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(meta) => file_identity(&meta) != self.identity,
            Err(_) => true,
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        if self.is_stale() {
            *self = Self::open(&self.path, self.level)?;
        }
        writeln!(self.file, "{}", line)
    }
}

#[cfg(unix)]
fn file_identity(meta: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn file_identity(_meta: &fs::Metadata) -> Option<(u64, u64)> {
    None
}

/// Logger writing formatted lines to stderr and, once configured, a file.
///
/// Construct it once and pass it (usually as `Arc<dyn LogSink>`) to whatever
/// needs to log.
#[derive(Debug)]
pub struct RuntimeLogger {
    name: String,
    level: Mutex<LogLevel>,
    formatter: LineFormatter,
    console: bool,
    file: Mutex<Option<FileHandler>>,
}

impl RuntimeLogger {
    pub fn new(name: impl Into<String>, level: LogLevel) -> Self {
        Self {
            name: name.into(),
            level: Mutex::new(level),
            formatter: LineFormatter::default(),
            console: true,
            file: Mutex::new(None),
        }
    }

    /// Disable the stderr handler; only a configured file receives lines.
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    pub fn with_formatter(mut self, formatter: LineFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        *self.level.lock()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.lock() = level;
    }

    /// The formatter shared by the console and file handlers.
    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    pub fn has_console(&self) -> bool {
        self.console
    }

    /// Path of the active file handler, if any.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.lock().as_ref().map(|h| h.path.clone())
    }

    /// Attach a file handler at `log_file`, replacing any previous one.
    ///
    /// Parent directories are created; the file is opened for append. The
    /// file handler records `Info` and above. If the file is later renamed
    /// or removed (log rotation), the next line reopens `log_file`.
    pub fn configure_stream(&self, log_file: impl AsRef<Path>) -> Result<()> {
        let path = log_file.as_ref();
        if path.as_os_str().is_empty() {
            bail!("log file path cannot be empty");
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
        }
        let handler = FileHandler::open(path, LogLevel::Info)
            .with_context(|| format!("failed to open log file {}", path.display()))?;

        *self.file.lock() = Some(handler);
        Ok(())
    }

    /// Drop the file handler, if any.
    pub fn detach_stream(&self) {
        *self.file.lock() = None;
    }
}

impl LogSink for RuntimeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if level < self.level() {
            return;
        }
        let line = self.formatter.format(level, message);

        // A failing handler must not fail the operation that logged.
        if self.console {
            let _ = writeln!(io::stderr().lock(), "{}", line);
        }
        if let Some(handler) = self.file.lock().as_mut() {
            if level >= handler.level {
                let _ = handler.write_line(&line);
            }
        }
    }
}

/// Build the process's `runtime` logger with a console handler.
pub fn setup_logging(level: LogLevel) -> Arc<RuntimeLogger> {
    Arc::new(RuntimeLogger::new(RUNTIME_LOGGER, level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_setup_logging_defaults() {
        let logger = setup_logging(LogLevel::Debug);
        assert_eq!(logger.name(), "runtime");
        assert_eq!(logger.level(), LogLevel::Debug);
        assert!(logger.has_console());
        assert!(logger.file_path().is_none());
    }

    #[test]
    fn test_line_format() {
        let formatter = LineFormatter::with_timestamp_format("TS");
        assert_eq!(formatter.format(LogLevel::Info, "hello"), "TS - INFO - hello");
    }

    #[test]
    fn test_empty_path_rejected() {
        let logger = RuntimeLogger::new("runtime", LogLevel::Info).without_console();
        let err = logger.configure_stream("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_configure_stream_replaces_previous_handler() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a").join("first.log");
        let second = temp.path().join("b").join("second.log");
        let logger = RuntimeLogger::new("runtime", LogLevel::Info).without_console();

        logger.configure_stream(&first).unwrap();
        logger.info("to first");
        logger.configure_stream(&second).unwrap();
        logger.info("to second");

        assert_eq!(logger.file_path(), Some(second.clone()));
        let first_content = fs::read_to_string(&first).unwrap();
        let second_content = fs::read_to_string(&second).unwrap();
        assert!(first_content.contains("to first"));
        assert!(!first_content.contains("to second"));
        assert!(second_content.contains("INFO - to second"));
    }

    #[test]
    fn test_levels_filter_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("filtered.log");
        let logger = RuntimeLogger::new("runtime", LogLevel::Debug).without_console();
        logger.configure_stream(&path).unwrap();

        logger.debug("below file threshold");
        logger.error("kept");
        logger.set_level(LogLevel::Error);
        logger.warning("below logger threshold");

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("below file threshold"));
        assert!(!content.contains("below logger threshold"));
        assert!(content.contains("ERROR - kept"));
    }

    #[test]
    fn test_file_reopened_after_rotation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runtime.log");
        let rotated = temp.path().join("runtime.log.1");
        let logger = RuntimeLogger::new("runtime", LogLevel::Info).without_console();
        logger.configure_stream(&path).unwrap();

        logger.info("before rotation");
        fs::rename(&path, &rotated).unwrap();
        logger.info("after rotation");

        let current = fs::read_to_string(&path).unwrap();
        let old = fs::read_to_string(&rotated).unwrap();
        assert!(current.contains("after rotation"));
        assert!(!current.contains("before rotation"));
        assert!(old.contains("before rotation"));
        assert!(!old.contains("after rotation"));
    }

    #[test]
    fn test_file_recreated_after_removal() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("runtime.log");
        let logger = RuntimeLogger::new("runtime", LogLevel::Info).without_console();
        logger.configure_stream(&path).unwrap();

        logger.info("first");
        fs::remove_file(&path).unwrap();
        logger.info("second");

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO - second"));
        assert!(!content.contains("first"));
    }
}
