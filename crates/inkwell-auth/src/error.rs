//! Signing error types

use thiserror::Error;

/// Errors raised before any signing work is done.
///
/// Every variant is an input problem; the cryptographic steps themselves
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("missing required field: {0}")]
    EmptyField(&'static str),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("url path is not valid percent-encoded UTF-8: {0}")]
    InvalidPath(String),

    #[error("invalid signing timestamp: {0}")]
    InvalidTimestamp(String),
}
