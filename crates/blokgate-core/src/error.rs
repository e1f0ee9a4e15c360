//! Error types for Blokgate operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Blokgate crates. Each variant corresponds to one failure class
//! a calling agent can branch on:
//!
//! | Kind | Raised when |
//! |------|-------------|
//! | `Config` | space id / access token missing or unusable |
//! | `Validation` | input violates a tool's declared contract |
//! | `Network` | no response was received (connect failure, timeout) |
//! | `Api` | the CMS answered with a non-success status |
//! | `Decode` | a success status carried an unparseable body |
//! | `SourceFetch` | the remote file for an upload could not be downloaded |
//! | `Io` | a local file, listener or stdio stream failed |

use thiserror::Error;

/// Boxed error used as the optional underlying cause of a network failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in Blokgate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or malformed credentials, bad base URL).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any request was built.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request never produced a response.
    #[error("Network error: {message}")]
    Network {
        /// What was being attempted.
        message: String,
        /// Underlying transport error, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The CMS responded with a non-success HTTP status.
    #[error("{}", api_message(.status_line, .detail.as_deref()))]
    Api {
        /// Numeric HTTP status.
        status: u16,
        /// Status line, e.g. `404 Not Found`.
        status_line: String,
        /// Most specific message recovered from the response body.
        detail: Option<String>,
    },

    /// A success status carried a body that could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The remote source file for an upload could not be fetched.
    #[error("Failed to fetch file: {0}")]
    SourceFetch(String),

    /// Local serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`Error::Config`].
    Config,
    /// See [`Error::Validation`].
    Validation,
    /// See [`Error::Network`].
    Network,
    /// See [`Error::Api`].
    Api,
    /// See [`Error::Decode`].
    Decode,
    /// See [`Error::SourceFetch`].
    SourceFetch,
    /// See [`Error::Serialization`].
    Serialization,
    /// See [`Error::Io`].
    Io,
}

fn api_message(status_line: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{status_line}: {detail}"),
        None => status_line.to_string(),
    }
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a network error without an underlying cause.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a network error wrapping the transport failure.
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an API error from a status and the best available detail.
    pub fn api(status: u16, status_line: impl Into<String>, detail: Option<String>) -> Self {
        Self::Api {
            status,
            status_line: status_line.into(),
            detail,
        }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a source fetch error.
    pub fn source_fetch(msg: impl Into<String>) -> Self {
        Self::SourceFetch(msg.into())
    }

    /// Create an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create an I/O error naming the file involved.
    pub fn io_with_path(err: std::io::Error, path: impl AsRef<std::path::Path>) -> Self {
        Self::Io(format!("{}: {err}", path.as_ref().display()))
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::Decode(_) => ErrorKind::Decode,
            Self::SourceFetch(_) => ErrorKind::SourceFetch,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether no response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Whether the CMS reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias using Blokgate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
