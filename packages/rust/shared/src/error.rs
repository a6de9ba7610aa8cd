//! Error types for symptomfix.
//!
//! Library crates use [`SymptomFixError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all symptomfix operations.
#[derive(Debug, thiserror::Error)]
pub enum SymptomFixError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Document store error (connection, query, write, index).
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored document did not have the expected shape.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SymptomFixError>;

impl SymptomFixError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a storage error from any displayable message.
    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Create a decode error from any displayable message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SymptomFixError::config("missing database name");
        assert_eq!(err.to_string(), "config error: missing database name");

        let err = SymptomFixError::storage("connection refused");
        assert_eq!(err.to_string(), "storage error: connection refused");

        let err = SymptomFixError::decode("symptoms is not an array");
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn every_variant_comes_from_a_constructor() {
        let source = std::io::Error::other("denied");
        let errors = [
            SymptomFixError::config("x"),
            SymptomFixError::storage("x"),
            SymptomFixError::decode("x"),
            SymptomFixError::io("x", source),
        ];
        for err in &errors {
            match err {
                SymptomFixError::Config { .. }
                | SymptomFixError::Storage(_)
                | SymptomFixError::Decode { .. }
                | SymptomFixError::Io { .. } => {}
            }
        }
    }

    #[test]
    fn io_error_keeps_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SymptomFixError::io("/tmp/symptomfix.toml", source);
        let msg = err.to_string();
        assert!(msg.contains("symptomfix.toml"));
        assert!(msg.contains("gone"));
    }
}
