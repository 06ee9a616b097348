//! Error type shared by every cache component.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A `{placeholder}` in a path template has no matching owner attribute.
    #[error("missing attribute `{name}` required by path template `{template}`")]
    MissingAttribute { name: String, template: String },

    #[error("malformed path template `{template}` at byte {position}: {reason}")]
    MalformedTemplate {
        template: String,
        position: usize,
        reason: &'static str,
    },

    /// A count-based cache was configured with a period of zero.
    #[error("count-based cache period must be positive, got {0}")]
    InvalidPeriod(u64),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cache entry: {0}")]
    Encode(String),

    /// The file at the cache path could not be decoded by the configured codec.
    #[error("failed to decode cache entry {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// The wrapped operation itself failed; nothing was written.
    #[error("cached operation failed: {0}")]
    Operation(#[source] anyhow::Error),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures raised while resolving a path template.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            CacheError::MissingAttribute { .. } | CacheError::MalformedTemplate { .. }
        )
    }
}
