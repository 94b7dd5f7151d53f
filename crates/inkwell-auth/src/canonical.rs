//! Canonical request construction
//!
//! Builds the exact string the storage service recomputes when it checks a
//! SigV4 signature. Only the pieces needed for a single-shot object PUT are
//! supported: the canonical query is always empty and the payload is always
//! hashed in full.
//!
//! Reference: https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html

use crate::digest::sha256_hex;
use crate::error::SigningError;
use std::collections::BTreeMap;
use std::fmt;

/// Header carrying the signing timestamp
pub const X_AMZ_DATE: &str = "x-amz-date";

/// Header carrying the temporary-credential session token
pub const X_AMZ_SECURITY_TOKEN: &str = "x-amz-security-token";

/// The headers an upload signs, by name.
///
/// `host`, `content-type` and `x-amz-date` are always present;
/// `x-amz-security-token` only when temporary credentials are in use.
#[derive(Debug, Clone, Copy)]
pub struct HeaderSet<'a> {
    pub host: &'a str,
    pub content_type: &'a str,
    pub amz_date: &'a str,
    pub security_token: Option<&'a str>,
}

impl<'a> HeaderSet<'a> {
    /// (name, value) pairs in no particular order
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &'a str)> {
        let mut pairs = vec![
            ("host", self.host),
            (X_AMZ_DATE, self.amz_date),
            ("content-type", self.content_type),
        ];
        if let Some(token) = self.security_token {
            pairs.push((X_AMZ_SECURITY_TOKEN, token));
        }
        pairs
    }
}

/// A SigV4 canonical request.
///
/// Headers are kept in a `BTreeMap` keyed by lowercased name, so the
/// canonical form does not depend on the order headers were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    method: String,
    path: String,
    headers: BTreeMap<String, String>,
    payload_hash: String,
}

impl CanonicalRequest {
    /// Start a canonical request for `method` on the raw (wire) URL path,
    /// hashing `payload` as the body.
    pub fn new(method: &str, raw_path: &str, payload: &[u8]) -> Result<Self, SigningError> {
        if method.is_empty() {
            return Err(SigningError::EmptyField("method"));
        }

        Ok(Self {
            method: method.to_ascii_uppercase(),
            path: canonical_path(raw_path)?,
            headers: BTreeMap::new(),
            payload_hash: sha256_hex(payload),
        })
    }

    /// Build the canonical request for an upload with the given header set
    pub fn for_upload(
        method: &str,
        raw_path: &str,
        headers: &HeaderSet<'_>,
        payload: &[u8],
    ) -> Result<Self, SigningError> {
        let mut request = Self::new(method, raw_path, payload)?;
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }
        Ok(request)
    }

    /// Add a header to sign. The name is lowercased, the value is kept verbatim.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Canonical URI path
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hex SHA-256 of the body
    #[must_use]
    pub fn payload_hash(&self) -> &str {
        &self.payload_hash
    }

    /// Sorted header names joined by `;`
    #[must_use]
    pub fn signed_headers(&self) -> String {
        self.headers
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// `name:value\n` for every header, sorted by name
    #[must_use]
    pub fn canonical_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect()
    }
}

impl fmt::Display for CanonicalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The query line is always empty for uploads.
        write!(
            f,
            "{}\n{}\n\n{}\n{}\n{}",
            self.method,
            self.path,
            self.canonical_headers(),
            self.signed_headers(),
            self.payload_hash
        )
    }
}

/// Canonical URI for a raw URL path.
///
/// Each `/`-separated segment is percent-decoded once and re-encoded with the
/// SigV4 unreserved set, so an already-encoded key is not double-encoded and
/// an unencoded one is encoded exactly once. Slashes are kept as-is.
pub fn canonical_path(raw_path: &str) -> Result<String, SigningError> {
    if raw_path.is_empty() || raw_path == "/" {
        return Ok("/".to_string());
    }

    let segments = raw_path
        .split('/')
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| urlencoding::encode(&decoded).into_owned())
                .map_err(|_| SigningError::InvalidPath(raw_path.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let path = segments.join("/");
    if path.starts_with('/') {
        Ok(path)
    } else {
        Ok(format!("/{path}"))
    }
}
