//! Error types for docshelf.
//!
//! Library crates use [`DocshelfError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! "Library not configured" is deliberately absent from this taxonomy: it is
//! signaled by returning `None` from resolution, never as an error.

use std::path::PathBuf;

/// Top-level error type for all docshelf operations.
#[derive(Debug, thiserror::Error)]
pub enum DocshelfError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Repository acquisition error (clone failure, unreachable remote,
    /// nonexistent branch).
    #[error("acquisition error: {0}")]
    Acquisition(String),

    /// Document parsing error (malformed front matter, unreadable bytes).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Markup compilation error, fatal to a single render request.
    #[error("compile error: {message}")]
    Compile { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocshelfError>;

impl DocshelfError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a compile error from any displayable message.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile {
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
