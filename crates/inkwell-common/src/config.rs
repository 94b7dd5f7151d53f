//! Storage configuration
//!
//! Region, bucket and credentials are read once, from an optional TOML file
//! layered under `AWS_*` environment variables, and then passed explicitly to
//! the upload client.

use crate::error::{Error, Result};
use crate::types::{BucketName, ObjectKey};
use config::{Config, Environment, File, FileFormat, Map, Source};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Environment variable prefix (`AWS_REGION`, `AWS_S3_BUCKET`, ...)
pub const ENV_PREFIX: &str = "AWS";

/// Environment keys that name a config field differently
const ENV_ALIASES: &[(&str, &str)] = &[("s3_bucket", "bucket"), ("endpoint_url", "endpoint")];

fn default_timeout_ms() -> u64 {
    30_000
}

/// Object storage settings for attachment uploads
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    /// AWS region (e.g., "us-east-1")
    #[serde(default)]
    pub region: String,
    /// Bucket attachments are written to
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,
    /// Base URL of an S3-compatible service. Objects are addressed
    /// path-style (`{endpoint}/{bucket}/{key}`) when set.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Upload request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl StorageConfig {
    /// Create a config for AWS S3 with long-term credentials
    pub fn new(
        region: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            endpoint: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Set the session token
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Address an S3-compatible endpoint instead of AWS
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Load from an optional TOML file and the process environment, then
    /// validate. Environment variables override the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(|p| File::from(p).format(FileFormat::Toml));
        let config = Self::build(file, Environment::with_prefix(ENV_PREFIX))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML text and an explicit set of environment variables,
    /// then validate
    pub fn from_sources(toml: Option<&str>, env: Map<String, String>) -> Result<Self> {
        let file = toml.map(|s| File::from_str(s, FileFormat::Toml));
        let config = Self::build(file, Environment::with_prefix(ENV_PREFIX).source(Some(env)))?;
        config.validate()?;
        Ok(config)
    }

    fn build<S>(file: Option<S>, env: Environment) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        let mut env_values = env
            .collect()
            .map_err(|e| Error::configuration(e.to_string()))?;
        for (from, to) in ENV_ALIASES {
            if let Some(value) = env_values.remove(*from) {
                env_values.insert((*to).to_string(), value);
            }
        }
        for (key, value) in env_values {
            builder = builder
                .set_override(key, value)
                .map_err(|e| Error::configuration(e.to_string()))?;
        }

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| Error::configuration(e.to_string()))
    }

    /// Check that everything needed to sign an upload is present
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("access_key_id", self.access_key_id.as_str()),
            ("secret_access_key", self.secret_access_key.as_str()),
            ("region", self.region.as_str()),
            ("bucket", self.bucket.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "storage credentials not configured: missing {}",
                missing.join(", ")
            )));
        }

        BucketName::new(self.bucket.as_str())?;

        if self.timeout_ms == 0 {
            return Err(Error::configuration("timeout_ms must be greater than zero"));
        }

        Ok(())
    }

    /// URL an object is uploaded to
    #[must_use]
    pub fn object_url(&self, key: &ObjectKey) -> String {
        match self.endpoint.as_deref() {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key.url_path()
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket,
                self.region,
                key.url_path()
            ),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
