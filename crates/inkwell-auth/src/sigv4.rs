//! AWS Signature V4 signing
//!
//! Signs single-shot object PUT requests. The whole body must be buffered
//! before signing since its SHA-256 is part of the canonical request.
//! Reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-authenticating-requests.html

use crate::canonical::{CanonicalRequest, HeaderSet};
use crate::digest::{DIGEST_LEN, hmac_sha256, sha256_hex};
use crate::error::SigningError;
use crate::time::SigningTime;
use http::Uri;
use std::fmt;

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Last component of every credential scope
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// Service name for object storage
pub const S3_SERVICE: &str = "s3";

/// Access key pair, optionally with a session token for temporary credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create long-term credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    #[must_use]
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    fn validate(&self) -> Result<(), SigningError> {
        if self.access_key_id.is_empty() {
            return Err(SigningError::EmptyField("access_key_id"));
        }
        if self.secret_access_key.is_empty() {
            return Err(SigningError::EmptyField("secret_access_key"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Key derived from the secret for one date/region/service scope
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; DIGEST_LEN]);

impl SigningKey {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// The request to sign
#[derive(Debug, Clone, Copy)]
pub struct UploadRequest<'a> {
    /// HTTP method, `PUT` for uploads
    pub method: &'a str,
    /// Full target URL, e.g. `https://bucket.s3.us-east-1.amazonaws.com/key`
    pub url: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

impl<'a> UploadRequest<'a> {
    /// A PUT of `body` to `url`
    #[must_use]
    pub const fn put(url: &'a str, content_type: &'a str, body: &'a [u8]) -> Self {
        Self {
            method: "PUT",
            url,
            content_type,
            body,
        }
    }
}

/// Signing output: everything that must be attached to the outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    /// Value signed as `host`
    pub host: String,
    /// `Content-Type` header value
    pub content_type: String,
    /// `x-amz-date` header value; identical to the signed timestamp
    pub amz_date: String,
    /// `x-amz-security-token` header value, when temporary credentials were used
    pub security_token: Option<String>,
    /// Hex SHA-256 of the body
    pub payload_hash: String,
    /// `;`-joined signed header names
    pub signed_headers: String,
    /// Hex signature
    pub signature: String,
    /// `Authorization` header value
    pub authorization: String,
}

/// AWS Signature V4 signer for one region and service
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    /// AWS region (e.g., "us-east-1")
    region: String,
    /// Service name (usually "s3")
    service: String,
}

impl SigV4Signer {
    /// Create a signer for S3 in `region`
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: S3_SERVICE.to_string(),
        }
    }

    /// Override the service name
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// `date/region/service/aws4_request`
    #[must_use]
    pub fn credential_scope(&self, date: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            date, self.region, self.service, SCOPE_TERMINATOR
        )
    }

    /// Sign an upload request.
    ///
    /// Fails only on malformed input; identical inputs always produce an
    /// identical result.
    pub fn sign(
        &self,
        request: &UploadRequest<'_>,
        credentials: &Credentials,
        time: &SigningTime,
    ) -> Result<SignedRequest, SigningError> {
        if self.region.is_empty() {
            return Err(SigningError::EmptyField("region"));
        }
        if self.service.is_empty() {
            return Err(SigningError::EmptyField("service"));
        }
        credentials.validate()?;

        let target = parse_target(request.url)?;

        let headers = HeaderSet {
            host: &target.host,
            content_type: request.content_type,
            amz_date: time.timestamp(),
            security_token: credentials.session_token(),
        };
        let canonical_request =
            CanonicalRequest::for_upload(request.method, &target.path, &headers, request.body)?;

        let credential_scope = self.credential_scope(time.date());
        let string_to_sign =
            build_string_to_sign(&canonical_request, time.timestamp(), &credential_scope);

        let signing_key = derive_signing_key(
            &credentials.secret_access_key,
            time.date(),
            &self.region,
            &self.service,
        );
        let signature = calculate_signature(&signing_key, &string_to_sign);
        let signed_headers = canonical_request.signed_headers();

        tracing::debug!(
            "Signed {} {}:\n  String to Sign:\n{}\n  Signed headers: {}",
            canonical_request.method(),
            canonical_request.path(),
            string_to_sign,
            signed_headers
        );

        let authorization = build_authorization_header(
            credentials.access_key_id(),
            &credential_scope,
            &signed_headers,
            &signature,
        );

        Ok(SignedRequest {
            host: target.host,
            content_type: request.content_type.to_string(),
            amz_date: time.timestamp().to_string(),
            security_token: credentials.session_token().map(str::to_string),
            payload_hash: canonical_request.payload_hash().to_string(),
            signed_headers,
            signature,
            authorization,
        })
    }
}

/// Host and path of the target URL
#[derive(Debug)]
struct Target {
    host: String,
    path: String,
}

fn parse_target(url: &str) -> Result<Target, SigningError> {
    if url.is_empty() {
        return Err(SigningError::EmptyField("url"));
    }

    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| SigningError::InvalidUrl(e.to_string()))?;

    let host = uri
        .host()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?
        .to_ascii_lowercase();

    if uri.query().is_some_and(|q| !q.is_empty()) {
        return Err(SigningError::InvalidUrl(format!(
            "query parameters cannot be signed for uploads: {url}"
        )));
    }

    // Default ports are omitted from the Host header by HTTP clients
    let default_port = match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };
    let host = match uri.port_u16() {
        Some(port) if Some(port) != default_port => format!("{host}:{port}"),
        _ => host,
    };

    Ok(Target {
        host,
        path: uri.path().to_string(),
    })
}

/// Build the string to sign
#[must_use]
pub fn build_string_to_sign(
    canonical_request: &CanonicalRequest,
    timestamp: &str,
    credential_scope: &str,
) -> String {
    let canonical_request_hash = sha256_hex(canonical_request.to_string().as_bytes());

    format!("{ALGORITHM}\n{timestamp}\n{credential_scope}\n{canonical_request_hash}")
}

/// Derive the signing key: date, then region, then service, then `aws4_request`
#[must_use]
pub fn derive_signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> SigningKey {
    let k_secret = format!("AWS4{secret_key}");
    let k_date = hmac_sha256(k_secret.as_bytes(), date);
    let k_region = hmac_sha256(&k_date, region);
    let k_service = hmac_sha256(&k_region, service);
    SigningKey(hmac_sha256(&k_service, SCOPE_TERMINATOR))
}

/// Calculate the hex signature
#[must_use]
pub fn calculate_signature(signing_key: &SigningKey, string_to_sign: &str) -> String {
    hex::encode(hmac_sha256(signing_key.as_bytes(), string_to_sign))
}

/// Format the `Authorization` header value
#[must_use]
pub fn build_authorization_header(
    access_key_id: &str,
    credential_scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={access_key_id}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://mybucket.s3.us-east-1.amazonaws.com/user123/1700000000000-abc.txt";
    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";

    fn credentials() -> Credentials {
        Credentials::new("AKIDEXAMPLE", SECRET)
    }

    fn time() -> SigningTime {
        SigningTime::parse("20231115T120000Z").unwrap()
    }

    fn sign_body(body: &[u8], creds: &Credentials, time: &SigningTime) -> SignedRequest {
        SigV4Signer::new("us-east-1")
            .sign(&UploadRequest::put(URL, "text/plain", body), creds, time)
            .unwrap()
    }

    #[test]
    fn test_derive_signing_key_known_vector() {
        // Example from the AWS SigV4 documentation
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key.as_bytes()),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_derive_signing_key_chain_order() {
        let key = derive_signing_key(SECRET, "20231115", "us-east-1", "s3");
        assert_eq!(
            hex::encode(key.as_bytes()),
            "a431b811b4fda140c10d94de2e1d64c31db6ad39fc596a41f4dc508cd21eff21"
        );
        // Swapping region and service must not give the same key
        let swapped = derive_signing_key(SECRET, "20231115", "s3", "us-east-1");
        assert_ne!(key, swapped);
    }

    #[test]
    fn test_sign_end_to_end() {
        let signed = sign_body(b"hello", &credentials(), &time());

        assert_eq!(
            signed.payload_hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(signed.host, "mybucket.s3.us-east-1.amazonaws.com");
        assert_eq!(signed.amz_date, "20231115T120000Z");
        assert_eq!(signed.signed_headers, "content-type;host;x-amz-date");
        assert_eq!(
            signed.signature,
            "71459503deded8e19cff2c8b07a32a2faf4d4ba21f418f9de3d89738d30cec64"
        );
        assert_eq!(
            signed.authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20231115/us-east-1/s3/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=71459503deded8e19cff2c8b07a32a2faf4d4ba21f418f9de3d89738d30cec64"
        );
        assert!(signed.security_token.is_none());
    }

    #[test]
    fn test_string_to_sign() {
        let headers = HeaderSet {
            host: "mybucket.s3.us-east-1.amazonaws.com",
            content_type: "text/plain",
            amz_date: "20231115T120000Z",
            security_token: None,
        };
        let canonical = CanonicalRequest::for_upload(
            "PUT",
            "/user123/1700000000000-abc.txt",
            &headers,
            b"hello",
        )
        .unwrap();
        let signer = SigV4Signer::new("us-east-1");
        let sts = build_string_to_sign(
            &canonical,
            "20231115T120000Z",
            &signer.credential_scope("20231115"),
        );
        assert_eq!(
            sts,
            "AWS4-HMAC-SHA256\n20231115T120000Z\n20231115/us-east-1/s3/aws4_request\n\
             daf945e53023e842f8b997d373124c3bb0cfc84e96093ca6e1661182fcc4289c"
        );
    }

    #[test]
    fn test_sign_with_session_token() {
        let plain = sign_body(b"hello", &credentials(), &time());
        let creds = credentials().with_session_token("FQoGZXIvYXdzEXAMPLETOKEN");
        let signed = sign_body(b"hello", &creds, &time());

        assert_eq!(
            signed.signed_headers,
            "content-type;host;x-amz-date;x-amz-security-token"
        );
        assert_eq!(
            signed.security_token.as_deref(),
            Some("FQoGZXIvYXdzEXAMPLETOKEN")
        );
        assert_eq!(
            signed.signature,
            "5c6a5cf615ebd6776bbd8008687cc02d4a1fead08e4e669477a172eda81ceeec"
        );
        assert_ne!(signed.signature, plain.signature);
    }

    #[test]
    fn test_sign_is_idempotent() {
        let a = sign_body(b"hello", &credentials(), &time());
        let b = sign_body(b"hello", &credentials(), &time());
        assert_eq!(a, b);
    }

    #[test]
    fn test_timestamp_changes_signature() {
        let a = sign_body(b"hello", &credentials(), &time());
        let later = SigningTime::parse("20231115T120001Z").unwrap();
        let b = sign_body(b"hello", &credentials(), &later);
        assert_ne!(a.signature, b.signature);
        assert_eq!(b.amz_date, "20231115T120001Z");
    }

    #[test]
    fn test_body_byte_changes_signature() {
        let a = sign_body(b"hello", &credentials(), &time());
        let b = sign_body(b"hellp", &credentials(), &time());
        assert_ne!(a.payload_hash, b.payload_hash);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn test_secret_never_in_output() {
        let signed = sign_body(b"hello", &credentials(), &time());
        assert!(!signed.authorization.contains(SECRET));
        assert!(!format!("{:?}", credentials()).contains(SECRET));
        let key = derive_signing_key(SECRET, "20231115", "us-east-1", "s3");
        assert_eq!(format!("{key:?}"), "SigningKey(<redacted>)");
    }

    #[test]
    fn test_sign_rejects_empty_fields() {
        let request = UploadRequest::put(URL, "text/plain", b"hello");

        let err = SigV4Signer::new("")
            .sign(&request, &credentials(), &time())
            .unwrap_err();
        assert_eq!(err, SigningError::EmptyField("region"));

        let err = SigV4Signer::new("us-east-1")
            .with_service("")
            .sign(&request, &credentials(), &time())
            .unwrap_err();
        assert_eq!(err, SigningError::EmptyField("service"));

        let err = SigV4Signer::new("us-east-1")
            .sign(&request, &Credentials::new("", SECRET), &time())
            .unwrap_err();
        assert_eq!(err, SigningError::EmptyField("access_key_id"));

        let err = SigV4Signer::new("us-east-1")
            .sign(&request, &Credentials::new("AKIDEXAMPLE", ""), &time())
            .unwrap_err();
        assert_eq!(err, SigningError::EmptyField("secret_access_key"));
    }

    #[test]
    fn test_sign_rejects_bad_urls() {
        let signer = SigV4Signer::new("us-east-1");
        let sign = |url| signer.sign(&UploadRequest::put(url, "text/plain", b""), &credentials(), &time());

        assert_eq!(sign(""), Err(SigningError::EmptyField("url")));
        assert!(matches!(sign("/just/a/path"), Err(SigningError::MissingHost(_))));
        assert!(matches!(sign("http://exa mple.com/"), Err(SigningError::InvalidUrl(_))));
        assert!(matches!(
            sign("https://b.s3.us-east-1.amazonaws.com/key?acl"),
            Err(SigningError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_host_keeps_non_default_port() {
        let signer = SigV4Signer::new("us-east-1");
        let signed = signer
            .sign(
                &UploadRequest::put("http://127.0.0.1:9000/bucket/key", "text/plain", b""),
                &credentials(),
                &time(),
            )
            .unwrap();
        assert_eq!(signed.host, "127.0.0.1:9000");

        let signed = signer
            .sign(
                &UploadRequest::put("https://Bucket.example.com:443/key", "text/plain", b""),
                &credentials(),
                &time(),
            )
            .unwrap();
        assert_eq!(signed.host, "bucket.example.com");
    }
}
