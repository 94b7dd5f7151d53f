//! Signed single-shot object uploads

use bytes::Bytes;
use inkwell_auth::canonical::{X_AMZ_DATE, X_AMZ_SECURITY_TOKEN};
use inkwell_auth::{Credentials, SigV4Signer, SigningTime, UploadRequest};
use inkwell_common::{Error, FileRecord, ObjectKey, Result, StorageConfig};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

/// Content type used when the caller does not supply one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file to store as a note attachment
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Owner; becomes the key prefix
    pub user_id: String,
    /// Original file name, used for the key extension and the record
    pub file_name: String,
    /// Empty means [`DEFAULT_CONTENT_TYPE`]
    pub content_type: String,
    pub body: Bytes,
}

/// Headers a signed upload must carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHeaders {
    pub content_type: String,
    /// Same string that was signed
    pub amz_date: String,
    pub authorization: String,
    pub security_token: Option<String>,
}

impl UploadHeaders {
    /// Convert to a header map for the HTTP client
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, header_value(&self.content_type)?);
        headers.insert(X_AMZ_DATE, header_value(&self.amz_date)?);
        headers.insert(AUTHORIZATION, header_value(&self.authorization)?);
        if let Some(token) = &self.security_token {
            headers.insert(X_AMZ_SECURITY_TOKEN, header_value(token)?);
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::invalid_request(format!("invalid header value: {e}")))
}

/// A signed, ready-to-send PUT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpload {
    pub url: String,
    pub headers: UploadHeaders,
}

/// Upload client for one bucket
pub struct UploadClient {
    config: StorageConfig,
    signer: SigV4Signer,
    credentials: Credentials,
    http_client: reqwest::Client,
}

impl UploadClient {
    /// Create a client from a storage config
    pub fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::configuration(e.to_string()))?;

        let mut credentials = Credentials::new(&config.access_key_id, &config.secret_access_key);
        if let Some(token) = config.session_token.as_deref().filter(|t| !t.is_empty()) {
            credentials = credentials.with_session_token(token);
        }

        Ok(Self {
            signer: SigV4Signer::new(&config.region),
            config,
            credentials,
            http_client,
        })
    }

    /// Get the storage config
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Sign a PUT of `body` to `key` at `time` without sending it
    pub fn prepare(
        &self,
        key: &ObjectKey,
        content_type: &str,
        body: &[u8],
        time: &SigningTime,
    ) -> Result<PreparedUpload> {
        let url = self.config.object_url(key);
        let content_type = if content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            content_type
        };

        let signed = self.signer.sign(
            &UploadRequest::put(&url, content_type, body),
            &self.credentials,
            time,
        )?;

        Ok(PreparedUpload {
            url,
            headers: UploadHeaders {
                content_type: signed.content_type,
                amz_date: signed.amz_date,
                authorization: signed.authorization,
                security_token: signed.security_token,
            },
        })
    }

    /// Sign and send a PUT of `body` to `key`, returning the object URL.
    ///
    /// The request is signed with the current time; a retry after a failure
    /// must call this again rather than replay the earlier request.
    pub async fn put_object(&self, key: &ObjectKey, content_type: &str, body: Bytes) -> Result<String> {
        self.send(key, content_type, body, &SigningTime::now()).await
    }

    async fn send(
        &self,
        key: &ObjectKey,
        content_type: &str,
        body: Bytes,
        time: &SigningTime,
    ) -> Result<String> {
        let prepared = self.prepare(key, content_type, &body, time)?;
        let headers = prepared.headers.to_header_map()?;
        let size = body.len();

        let response = self
            .http_client
            .put(&prepared.url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "Upload of {} failed with status {}: {}",
                key,
                status,
                body
            );
            return Err(Error::UploadFailed {
                status: status.as_u16(),
            });
        }

        tracing::info!("Uploaded {} ({} bytes)", key, size);
        Ok(prepared.url)
    }

    /// Upload a user's file under a freshly generated key.
    ///
    /// The key's timestamp and the signature's `x-amz-date` come from the
    /// same instant.
    pub async fn upload(&self, file: FileUpload) -> Result<FileRecord> {
        if file.body.is_empty() {
            return Err(Error::invalid_request("no file provided"));
        }

        let time = SigningTime::now();
        let key = ObjectKey::generate(&file.user_id, &file.file_name, time.instant())?;
        let mime_type = if file.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            file.content_type
        };
        let file_size = file.body.len() as u64;

        let file_url = self.send(&key, &mime_type, file.body, &time).await?;

        Ok(FileRecord {
            user_id: file.user_id,
            file_name: file.file_name,
            file_url,
            file_size,
            mime_type,
        })
    }
}

impl std::fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadClient")
            .field("config", &self.config)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
