//! Error types for Inkwell
//!
//! This module defines the common error types used by the upload path.

use crate::types::{BucketNameError, ObjectKeyError};
use inkwell_auth::SigningError;
use thiserror::Error;

/// Common result type for Inkwell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Inkwell
#[derive(Debug, Error)]
pub enum Error {
    // Input errors
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid bucket name: {0}")]
    InvalidBucketName(#[from] BucketNameError),

    #[error("invalid object key: {0}")]
    InvalidObjectKey(#[from] ObjectKeyError),

    #[error("request signing failed: {0}")]
    Signing(#[from] SigningError),

    // Upload errors. The storage service's reason is logged, not carried.
    #[error("upload failed")]
    UploadFailed { status: u16 },

    // Network errors
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timeout")]
    Timeout,

    // Internal errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this is a retryable error.
    ///
    /// A retry must sign again with a fresh timestamp; re-sending the same
    /// signed request is never useful.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionFailed(_) => true,
            Self::UploadFailed { status } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status code to report to the application's own callers
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::InvalidRequest(_)
            | Self::InvalidBucketName(_)
            | Self::InvalidObjectKey(_)
            | Self::Signing(_) => 400,

            // 504 Gateway Timeout
            Self::Timeout => 504,

            // 500 Internal Server Error
            Self::UploadFailed { .. }
            | Self::ConnectionFailed(_)
            | Self::Configuration(_)
            | Self::Internal(_) => 500,
        }
    }
}
