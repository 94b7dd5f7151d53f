//! Signing timestamps

use crate::error::SigningError;
use chrono::{DateTime, NaiveDateTime, Utc};

/// `x-amz-date` format: 20130524T000000Z
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Credential-scope date format: 20130524
pub const DATE_FORMAT: &str = "%Y%m%d";

/// The date and timestamp strings used for one signature.
///
/// Both strings are formatted from the same UTC instant when the value is
/// built, so the scope date can never drift from `x-amz-date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningTime {
    instant: DateTime<Utc>,
    date: String,
    timestamp: String,
}

impl SigningTime {
    /// Capture the current instant
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Build from an explicit UTC instant
    #[must_use]
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            date: instant.format(DATE_FORMAT).to_string(),
            timestamp: instant.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Parse an ISO-8601 basic timestamp such as `20231115T120000Z`
    pub fn parse(timestamp: &str) -> Result<Self, SigningError> {
        NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
            .map(|dt| Self::from_datetime(DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)))
            .map_err(|_| SigningError::InvalidTimestamp(timestamp.to_string()))
    }

    /// `YYYYMMDD`
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// `YYYYMMDDTHHMMSSZ`, the value sent as `x-amz-date`
    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// The instant both strings were formatted from
    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }
}
