//! Core type definitions for Inkwell
//!
//! Bucket names, object keys for uploaded attachments, and the metadata
//! record returned after an upload.

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of the bucket attachments are stored in
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct BucketName(String);

impl BucketName {
    /// Create a new bucket name (validates S3 naming rules)
    pub fn new(name: impl Into<String>) -> Result<Self, BucketNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the bucket name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A bucket must work as the first label of a virtual-hosted host name:
    /// 3-63 characters of `a-z`, `0-9`, `-` and `.`, where every
    /// dot-separated label is non-empty and neither starts nor ends with `-`.
    fn validate(name: &str) -> Result<(), BucketNameError> {
        if !(3..=63).contains(&name.len()) {
            return Err(BucketNameError::Length(name.len()));
        }

        if let Some(c) = name
            .chars()
            .find(|&c| !matches!(c, 'a'..='z' | '0'..='9' | '-' | '.'))
        {
            return Err(BucketNameError::InvalidChar(c));
        }

        let bad_label = name
            .split('.')
            .any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-'));
        if bad_label {
            return Err(BucketNameError::InvalidLabel(name.to_string()));
        }

        Ok(())
    }
}

impl fmt::Debug for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BucketName({:?})", self.0)
    }
}

/// Why a bucket name cannot be used in a request host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BucketNameError {
    #[error("bucket name must be 3 to 63 characters, got {0}")]
    Length(usize),
    #[error("bucket name contains invalid character: {0:?}")]
    InvalidChar(char),
    #[error("bucket name is not a valid host label: {0:?}")]
    InvalidLabel(String),
}

/// Object key (path within a bucket)
///
/// Uploaded attachments are keyed `{user_id}/{unix_millis}-{uuid}.{ext}` so
/// that each upload gets a fresh key and a user's files share a prefix.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Parse an existing object key
    pub fn new(key: impl Into<String>) -> Result<Self, ObjectKeyError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    /// Generate a fresh key for a file uploaded by `user_id`.
    ///
    /// The extension is whatever follows the last `.` of `file_name`; a name
    /// without one yields a key without an extension.
    pub fn generate(
        user_id: &str,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ObjectKeyError> {
        if user_id.is_empty() || user_id.contains('/') || is_dot_segment(user_id) {
            return Err(ObjectKeyError::InvalidUserId(user_id.to_string()));
        }

        let millis = now.timestamp_millis();
        let id = Uuid::new_v4();
        let key = match extension(file_name) {
            Some(ext) => format!("{user_id}/{millis}-{id}.{ext}"),
            None => format!("{user_id}/{millis}-{id}"),
        };
        Self::new(key)
    }

    /// Get the object key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key as it appears in a request path: every segment
    /// percent-encoded, slashes kept
    #[must_use]
    pub fn url_path(&self) -> String {
        self.0
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Validate object key
    fn validate(key: &str) -> Result<(), ObjectKeyError> {
        if key.is_empty() {
            return Err(ObjectKeyError::Empty);
        }

        // Maximum length: 1024 bytes (UTF-8)
        if key.len() > 1024 {
            return Err(ObjectKeyError::TooLong);
        }

        if key.starts_with('/') || key.split('/').any(str::is_empty) {
            return Err(ObjectKeyError::EmptySegment);
        }

        // HTTP clients collapse these before sending, so the path that
        // arrives would not be the path that was signed
        if key.split('/').any(is_dot_segment) {
            return Err(ObjectKeyError::DotSegment);
        }

        Ok(())
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({:?})", self.0)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

fn extension(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
}

/// Errors that can occur when creating an object key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectKeyError {
    #[error("object key cannot be empty")]
    Empty,
    #[error("object key cannot exceed 1024 bytes")]
    TooLong,
    #[error("object key cannot start with '/' or contain empty segments")]
    EmptySegment,
    #[error("object key cannot contain '.' or '..' segments")]
    DotSegment,
    #[error("invalid user id for object key: {0:?}")]
    InvalidUserId(String),
}

/// Metadata describing an uploaded attachment.
///
/// Handed back to the caller, which owns persisting it alongside the note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Owner of the file
    pub user_id: String,
    /// Original file name as supplied by the user
    pub file_name: String,
    /// URL the object was uploaded to
    pub file_url: String,
    /// Size in bytes
    pub file_size: u64,
    /// Content type sent with the upload
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bucket_name_valid() {
        assert!(BucketName::new("my-bucket").is_ok());
        assert!(BucketName::new("bucket123").is_ok());
        assert!(BucketName::new("notes.attachments-2").is_ok());
    }

    #[test]
    fn test_bucket_name_invalid() {
        assert_eq!(BucketName::new("ab"), Err(BucketNameError::Length(2)));
        assert_eq!(BucketName::new("b".repeat(64)), Err(BucketNameError::Length(64)));
        assert_eq!(BucketName::new("Bucket"), Err(BucketNameError::InvalidChar('B')));
        assert_eq!(BucketName::new("my_bucket"), Err(BucketNameError::InvalidChar('_')));
        for name in ["-bucket", "bucket-", "bucket..name", ".bucket", "notes-.files"] {
            assert!(
                matches!(BucketName::new(name), Err(BucketNameError::InvalidLabel(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_object_key_generate() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let key = ObjectKey::generate("user123", "notes.final.txt", now).unwrap();
        let (prefix, rest) = key.as_str().split_once('/').unwrap();
        assert_eq!(prefix, "user123");
        assert!(rest.starts_with("1700000000000-"));
        assert!(rest.ends_with(".txt"));
        // millis + '-' + hyphenated uuid + ".txt"
        assert_eq!(rest.len(), 13 + 1 + 36 + 4);
    }

    #[test]
    fn test_object_key_generate_is_unique() {
        let now = Utc::now();
        let a = ObjectKey::generate("u", "a.png", now).unwrap();
        let b = ObjectKey::generate("u", "a.png", now).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_object_key_without_extension() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let key = ObjectKey::generate("user123", "README", now).unwrap();
        assert!(!key.as_str().contains('.'));
        let key = ObjectKey::generate("user123", "trailing.", now).unwrap();
        assert!(!key.as_str().ends_with('.'));
    }

    #[test]
    fn test_object_key_rejects_bad_user_id() {
        let now = Utc::now();
        assert!(matches!(
            ObjectKey::generate("", "a.txt", now),
            Err(ObjectKeyError::InvalidUserId(_))
        ));
        assert!(matches!(
            ObjectKey::generate("a/b", "a.txt", now),
            Err(ObjectKeyError::InvalidUserId(_))
        ));
        for user_id in [".", ".."] {
            assert_eq!(
                ObjectKey::generate(user_id, "a.txt", now),
                Err(ObjectKeyError::InvalidUserId(user_id.to_string()))
            );
        }
    }

    #[test]
    fn test_object_key_validation() {
        assert_eq!(ObjectKey::new(""), Err(ObjectKeyError::Empty));
        assert_eq!(ObjectKey::new("/abs"), Err(ObjectKeyError::EmptySegment));
        assert_eq!(ObjectKey::new("a//b"), Err(ObjectKeyError::EmptySegment));
        assert_eq!(ObjectKey::new("x".repeat(1025)), Err(ObjectKeyError::TooLong));
        assert!(ObjectKey::new("user123/file.txt").is_ok());
    }

    #[test]
    fn test_object_key_rejects_dot_segments() {
        assert_eq!(ObjectKey::new("user123/../evil.txt"), Err(ObjectKeyError::DotSegment));
        assert_eq!(ObjectKey::new("./user123/a.txt"), Err(ObjectKeyError::DotSegment));
        assert_eq!(ObjectKey::new("user123/.."), Err(ObjectKeyError::DotSegment));
        // Dots inside a segment are ordinary characters
        assert!(ObjectKey::new("user123/.../a..b/.hidden").is_ok());
    }

    #[test]
    fn test_object_key_url_path() {
        let key = ObjectKey::new("user123/my notes/café.txt").unwrap();
        assert_eq!(key.url_path(), "user123/my%20notes/caf%C3%A9.txt");
        let key = ObjectKey::new("user123/1700000000000-abc.txt").unwrap();
        assert_eq!(key.url_path(), "user123/1700000000000-abc.txt");
    }
}
