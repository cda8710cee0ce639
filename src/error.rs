//! Error types for diskmemo

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for diskmemo operations
pub type Result<T> = std::result::Result<T, MemoError>;

/// Error types for memoized calls and cache maintenance
#[derive(Error, Debug)]
pub enum MemoError {
    /// Arguments or a return value could not be serialized
    #[error("Cache error: cannot serialize {context}: {source}")]
    Serialization {
        context: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Named arguments did not serialize to a map (a serialization failure
    /// detected after encoding, so it carries no source)
    #[error("Cache error: named arguments must serialize to a map, got {found}")]
    InvalidKwargs { found: &'static str },

    /// An existing artifact could not be parsed back into a value
    #[error("Cache error: cannot deserialize artifact '{}': {source}", path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },

    /// Directory creation or file I/O failed
    #[error("Cache error: filesystem operation on '{}' failed: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Function name cannot be embedded in a flat artifact filename
    #[error("Invalid function name '{0}': must be non-empty and contain no path separators")]
    InvalidFunctionName(String),

    /// I/O error outside the cache directory (e.g. writing CLI output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The wrapped function itself failed
    #[error("Wrapped function failed: {0}")]
    Function(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl MemoError {
    pub fn serialization(
        context: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Serialization {
            context,
            source: source.into(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_filesystem_error_names_path() {
        let err = MemoError::filesystem(
            "/no/such/dir",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/no/such/dir"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_function_error_keeps_source() {
        let inner = io::Error::new(io::ErrorKind::Other, "boom");
        let err = MemoError::Function(Box::new(inner));
        assert_eq!(err.to_string(), "Wrapped function failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
