//! Inkwell upload client
//!
//! Signs attachment uploads with SigV4 and sends them straight to object
//! storage with a single PUT.

pub mod upload;

pub use upload::{FileUpload, PreparedUpload, UploadClient, UploadHeaders};
