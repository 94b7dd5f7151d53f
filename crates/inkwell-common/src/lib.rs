//! Inkwell Common - Shared types and utilities
//!
//! This crate provides the storage configuration, object key and file
//! record types, and the error type shared by the upload client and CLI.

pub mod config;
pub mod error;
pub mod types;

pub use config::StorageConfig;
pub use error::{Error, Result};
pub use types::*;
