//! Error types for sitebuild.
//!
//! Library crates use [`SitebuildError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all sitebuild operations.
#[derive(Debug, thiserror::Error)]
pub enum SitebuildError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Stylesheet compilation or minification error.
    #[error("style error in {file}: {message}")]
    Style { file: String, message: String },

    /// Script minification error.
    #[error("script error in {file}: {message}")]
    Script { file: String, message: String },

    /// Vendor/media/HTML copy error.
    #[error("copy error: {0}")]
    Copy(String),

    /// Filesystem watcher error.
    #[error("watch error: {0}")]
    Watch(String),

    /// Preview server error.
    #[error("serve error: {0}")]
    Serve(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad glob pattern, invalid layout, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SitebuildError>;

impl SitebuildError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a style error tied to a source file.
    pub fn style(file: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Style {
            file: file.into(),
            message: msg.into(),
        }
    }

    /// Create a script error tied to a source file.
    pub fn script(file: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Script {
            file: file.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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
        let err = SitebuildError::config("missing [site] section");
        assert_eq!(err.to_string(), "config error: missing [site] section");

        let err = SitebuildError::style("scss/home.scss", "undefined variable $accent");
        assert!(err.to_string().contains("scss/home.scss"));
        assert!(err.to_string().contains("$accent"));
    }
}
