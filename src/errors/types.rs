//! Error type definitions for the catalog sync core
//!
//! This module defines all error types used throughout the crate,
//! providing a hierarchical error system that keeps backend failures,
//! record decoding failures, and local store failures distinguishable
//! at the call site.

use thiserror::Error;

/// Top-level error type surfaced by the fetch engine, the mutation
/// reconciler, and the session layer.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Remote catalog backend failed (network, auth, quota). Recoverable;
    /// the user may retry.
    #[error("remote catalog unavailable: {message}")]
    RemoteUnavailable { message: String },

    /// A continuation token was used against a query other than the one
    /// that produced it, or the token itself is malformed. Programmer
    /// error; must not surface to end users.
    #[error("invalid continuation token: {reason}")]
    InvalidToken { reason: String },

    /// The mutation target no longer exists remotely. Recoverable;
    /// surfaces as "this spot may have been removed".
    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    /// The publish path failed after partial local work. Partial state
    /// (uploaded assets, the unsaved record) is discarded; no retry queue.
    #[error("publish failed: {message}")]
    PublishFailed { message: String },

    /// Input was rejected before any remote call was issued.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// A page fetch was started while another was still in flight for
    /// the same session. Callers must gate on the engine's `is_fetching`
    /// observable.
    #[error("a fetch is already in flight for this session")]
    FetchInProgress,

    /// Configuration loading or parsing failed.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A raw remote record could not be decoded.
    #[error("record decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Local persistence cache failed during an already-imported lookup.
    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-record decode failures produced by the single explicit decode step.
///
/// Default-substitution rules absorb most schema drift: counters default
/// to zero, text fields to the empty string, image lists to empty. Only
/// the identity-bearing fields are hard requirements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required field is absent from the raw record
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// A field is present with an unexpected value type
    #[error("field '{field}' has unexpected type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Failures reported by the remote catalog backend client.
///
/// The core treats the backend as a black box; everything it can do
/// wrong collapses into these two cases.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network, auth, or quota failure
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    /// The backend rejected the resumption cursor it was handed
    #[error("backend rejected cursor: {message}")]
    BadCursor { message: String },
}

/// Failures reported by the device-local persistence cache.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The local store could not be read or written
    #[error("local store unavailable: {message}")]
    Unavailable { message: String },
}

/// Convenience constructors for common error types
impl CatalogError {
    /// Create a remote-unavailable error with a custom message
    pub fn remote_unavailable<S: Into<String>>(message: S) -> Self {
        Self::RemoteUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid-token error
    pub fn invalid_token<S: Into<String>>(reason: S) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    /// Create a record-not-found error for a specific identifier
    pub fn record_not_found<S: Into<String>>(id: S) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create a publish-failed error
    pub fn publish_failed<S: Into<String>>(message: S) -> Self {
        Self::PublishFailed {
            message: message.into(),
        }
    }

    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl BackendError {
    /// Create an unavailable error with a custom message
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a bad-cursor error
    pub fn bad_cursor<S: Into<String>>(message: S) -> Self {
        Self::BadCursor {
            message: message.into(),
        }
    }
}

impl StoreError {
    /// Create an unavailable error with a custom message
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

impl From<BackendError> for CatalogError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable { message } => Self::RemoteUnavailable { message },
            BackendError::BadCursor { message } => Self::InvalidToken { reason: message },
        }
    }
}
