//! Error types for impress library.

use std::io;
use thiserror::Error;

/// Result type alias for impress operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while validating or rendering a document.
#[derive(Error, Debug)]
pub enum Error {
    /// The input tree does not match the document schema.
    #[error("Invalid document at `{path}`: expected {expected}")]
    Validation {
        /// Path of the first offending value, e.g. `content[0].attrs.level`
        path: String,
        /// Description of the expected shape
        expected: String,
    },

    /// An image could not be fetched or converted.
    #[error("Failed to load asset {url}: {reason}")]
    Resource {
        /// Source URL of the asset
        url: String,
        /// Underlying cause
        reason: String,
    },

    /// A renderer invariant was violated. Always a bug in impress.
    #[error("Internal renderer error: {0}")]
    Internal(String),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON input or output serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while assembling the PDF object graph.
    #[error("PDF writing error: {0}")]
    Pdf(String),
}

/// Coarse classification of errors, used to decide who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent a malformed document or request.
    Validation,
    /// An external resource failed.
    Resource,
    /// A defect in the renderer.
    Internal,
}

impl Error {
    /// Create a validation error for `path`.
    pub fn validation(path: impl Into<String>, expected: impl Into<String>) -> Self {
        Error::Validation {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Create a resource error for `url`.
    pub fn resource(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::Resource {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an internal error and log it.
    ///
    /// Internal errors indicate a defect in the renderer rather than bad
    /// input, so they are logged where they are raised.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("renderer invariant violated: {}", message);
        Error::Internal(message)
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } | Error::Json(_) => ErrorKind::Validation,
            Error::Resource { .. } | Error::Io(_) => ErrorKind::Resource,
            Error::Internal(_) | Error::Pdf(_) => ErrorKind::Internal,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::Pdf(err.to_string()),
        }
    }
}
