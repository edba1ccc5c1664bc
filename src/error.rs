use std::time::Duration;

use thiserror::Error;

use crate::models::RejectionReason;
use crate::utils::units::UnitError;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid time zone: {0}")]
    InvalidTimezone(String),

    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Reading rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Failure talking to the upstream data source. Retried only on the next poll.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized: check the station API key")]
    Unauthorized,

    #[error("station not found")]
    NotFound,

    #[error("rate limited by data source")]
    RateLimited,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no more readings available")]
    Exhausted,
}

/// Why a pipeline cycle produced no snapshot. Never fatal: the next poll
/// starts from the state left by the last successful cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("reading rejected: {0}")]
    Rejected(RejectionReason),
}

impl CycleError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, CycleError::Rejected(_))
    }
}
