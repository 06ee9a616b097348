//! Filesystem locations and logging configuration.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use trading_log::{setup_logging, LogLevel, RuntimeLogger};

/// Environment variable overriding the base directory.
pub const HOME_ENV: &str = "TRADING_TOOLS_HOME";

#[derive(Debug, Clone)]
pub struct ToolsPaths {
    base: PathBuf,
}

impl ToolsPaths {
    pub fn from_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base.clone()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.base.join("cache")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base.join("logs")
    }
}

/// `$TRADING_TOOLS_HOME`, else `~/.trading-tools`.
pub fn default_paths() -> ToolsPaths {
    let base = std::env::var(HOME_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".trading-tools")
        });
    ToolsPaths::from_base(base)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub level: LogLevel,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_paths().logs_dir().join("runtime.log"),
            level: LogLevel::Info,
        }
    }
}

impl LogConfig {
    /// Build the runtime logger, attaching the file handler when enabled.
    pub fn build_logger(&self) -> Result<Arc<RuntimeLogger>> {
        let logger = setup_logging(self.level);
        if self.enabled {
            logger.configure_stream(&self.path)?;
        }
        Ok(logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_base() {
        let paths = ToolsPaths::from_base("/srv/tools");
        assert_eq!(paths.cache_dir(), PathBuf::from("/srv/tools/cache"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/srv/tools/logs"));
    }

    #[test]
    fn test_log_config_deserializes_level() {
        let config: LogConfig =
            serde_json::from_str(r#"{"enabled":true,"path":"/tmp/x.log","level":"warning"}"#)
                .unwrap();
        assert!(config.enabled);
        assert_eq!(config.level, LogLevel::Warning);
    }

    #[test]
    fn test_build_logger_attaches_file_when_enabled() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("logs").join("runtime.log");

        let disabled = LogConfig {
            enabled: false,
            path: path.clone(),
            level: LogLevel::Info,
        };
        assert!(disabled.build_logger().unwrap().file_path().is_none());
        assert!(!path.exists());

        let enabled = LogConfig {
            enabled: true,
            ..disabled
        };
        let logger = enabled.build_logger().unwrap();
        assert_eq!(logger.file_path(), Some(path.clone()));
        assert!(path.exists());
    }
}
