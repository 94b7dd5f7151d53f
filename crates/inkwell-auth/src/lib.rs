//! Inkwell request signing
//!
//! This crate provides:
//! - SHA-256 / HMAC-SHA256 primitives
//! - SigV4 canonical request construction
//! - AWS Signature V4 signing for single-shot object uploads
//!
//! # Example
//!
//! ```rust
//! use inkwell_auth::{Credentials, SigV4Signer, SigningTime, UploadRequest};
//!
//! let signer = SigV4Signer::new("us-east-1");
//! let credentials = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY");
//! let time = SigningTime::parse("20231115T120000Z").unwrap();
//!
//! let request = UploadRequest::put(
//!     "https://mybucket.s3.us-east-1.amazonaws.com/user123/notes.txt",
//!     "text/plain",
//!     b"hello",
//! );
//! let signed = signer.sign(&request, &credentials, &time).unwrap();
//! assert!(signed.authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20231115/"));
//! assert_eq!(signed.amz_date, "20231115T120000Z");
//! ```

pub mod canonical;
pub mod digest;
pub mod error;
pub mod sigv4;
pub mod time;

pub use canonical::{CanonicalRequest, HeaderSet};
pub use digest::{hmac_sha256, sha256_hex};
pub use error::SigningError;
pub use sigv4::{Credentials, SigV4Signer, SignedRequest, SigningKey, UploadRequest};
pub use time::SigningTime;
