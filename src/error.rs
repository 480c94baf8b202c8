//! Error types for query-fetch
//!
//! Every failure a fetch can produce is recoverable and is handed to the
//! consumer callback as `Err(Error)`. This module provides:
//! - The top-level [`Error`] with one variant per failure class
//! - [`TransportError`] for everything that goes wrong before a response body is available
//! - [`ErrorKind`] for machine-readable classification

use crate::field_path::FieldPathError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for query-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for query-fetch
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter could not be encoded into the query string
    #[error("cannot encode parameter `{key}`: {reason}")]
    Encoding {
        /// The key of the offending parameter (may be empty when the key itself is invalid)
        key: String,
        /// Why the parameter could not be encoded
        reason: String,
    },

    /// The base URL was empty or the assembled URL could not be parsed
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl {
        /// The URL text that was rejected
        url: String,
        /// Parser message or validation failure
        reason: String,
    },

    /// Network or connectivity failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status code
    #[error("HTTP {status} from {url}")]
    ResponseStatus {
        /// The requested URL
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// The response body was not valid JSON, or did not match the requested type
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A field named in the field path was missing or had the wrong type
    #[error("field path error: {0}")]
    FieldPath(#[from] FieldPathError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "request_timeout")
        key: Option<String>,
    },
}

/// Failures that happen before a usable response body exists
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client reported an error (connect, TLS, body read, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No response arrived within the configured timeout
    #[error("request to {url} timed out after {after:?}")]
    Timeout {
        /// The requested URL
        url: String,
        /// The timeout that elapsed
        after: Duration,
    },

    /// The server answered successfully but sent no data
    #[error("no data returned from {url}")]
    EmptyBody {
        /// The requested URL
        url: String,
    },

    /// Any other transport-level failure reported by a custom transport
    #[error("request to {url} failed: {reason}")]
    Other {
        /// The requested URL
        url: String,
        /// Description of the failure
        reason: String,
    },
}

/// Machine-readable failure class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`Error::Encoding`]
    Encoding,
    /// See [`Error::InvalidUrl`]
    InvalidUrl,
    /// See [`Error::Transport`]
    Transport,
    /// See [`Error::ResponseStatus`]
    ResponseStatus,
    /// See [`Error::Decode`]
    Decode,
    /// See [`Error::FieldPath`]
    FieldPath,
    /// See [`Error::Config`]
    Config,
}

impl ErrorKind {
    /// Stable string code for logs and serialized diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Encoding => "encoding_error",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::Transport => "transport_error",
            ErrorKind::ResponseStatus => "response_status_error",
            ErrorKind::Decode => "decode_error",
            ErrorKind::FieldPath => "field_path_error",
            ErrorKind::Config => "config_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Encoding { .. } => ErrorKind::Encoding,
            Error::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            Error::Transport(_) => ErrorKind::Transport,
            Error::ResponseStatus { .. } => ErrorKind::ResponseStatus,
            Error::Decode(_) => ErrorKind::Decode,
            Error::FieldPath(_) => ErrorKind::FieldPath,
            Error::Config { .. } => ErrorKind::Config,
        }
    }

    /// HTTP status carried by this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ResponseStatus { status, .. } => Some(*status),
            Error::Transport(TransportError::Request(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn encoding(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Encoding {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
