//! Error types for Quarry operations.
//!
//! Hard failures only. Soft conditions (searching an unregistered record
//! type, a match whose source record has since been deleted) are handled
//! in place by the search layer and never reach this type.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using Quarry's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Quarry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A backend identifier could not be resolved to a usable backend.
    #[error("Invalid search backend '{identifier}': {reason}")]
    InvalidBackend {
        /// Short name or locator that was requested.
        identifier: String,
        /// Why resolution failed.
        reason: String,
    },

    /// A filter predicate is not valid for the target field.
    #[error("Invalid filter on '{field}': {reason}")]
    InvalidFilter {
        /// Field the predicate names.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The underlying index engine failed or rejected an operation.
    #[error("Engine error: {message}")]
    Engine {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The record storage collaborator failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error with the path involved.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed persisted data or input file.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Returns whether retrying the same operation could succeed.
    ///
    /// Engine, storage and I/O failures may be transient. Everything else
    /// describes a caller or configuration mistake.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Engine { .. } => true,
            Error::Storage { .. } => true,
            Error::Io { .. } => true,
            Error::InvalidBackend { .. } => false,
            Error::InvalidFilter { .. } => false,
            Error::Config(_) => false,
            Error::Parse(_) => false,
        }
    }

    /// Create an invalid backend error.
    pub fn invalid_backend(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidBackend {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid filter error.
    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an engine error with a message.
    pub fn engine(message: impl Into<String>) -> Self {
        Error::Engine {
            message: message.into(),
            source: None,
        }
    }

    /// Create an engine error with a message and source error.
    pub fn engine_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Engine {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
