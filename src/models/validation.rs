use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{Field, RawReading};

/// Why a reading was kept out of the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    #[error("required field {0} is missing")]
    MissingField(Field),

    #[error("{field} = {value} is outside the physical range [{min}, {max}]")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("reading at {timestamp} is older than the last accepted reading at {previous}")]
    OutOfOrder {
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("reading at {timestamp} was already processed")]
    Duplicate { timestamp: DateTime<Utc> },
}

/// Something suspicious about a reading that is still kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    SuddenChange {
        field: Field,
        previous: f64,
        current: f64,
        limit: f64,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SuddenChange {
                field,
                previous,
                current,
                limit,
            } => write!(
                f,
                "{} jumped from {:.1} to {:.1} (limit {:.1}); possible sensor glitch",
                field, previous, current, limit
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted(RawReading),
    Rejected(RejectionReason),
    Flagged(RawReading, Vec<Warning>),
}

impl ValidationOutcome {
    pub fn reading(&self) -> Option<&RawReading> {
        match self {
            ValidationOutcome::Accepted(reading) | ValidationOutcome::Flagged(reading, _) => {
                Some(reading)
            }
            ValidationOutcome::Rejected(_) => None,
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            ValidationOutcome::Flagged(_, warnings) => warnings,
            _ => &[],
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ValidationOutcome::Rejected(_))
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, ValidationOutcome::Flagged(..))
    }

    /// Split into the kept reading and its warnings, or the rejection reason.
    pub fn into_result(self) -> std::result::Result<(RawReading, Vec<Warning>), RejectionReason> {
        match self {
            ValidationOutcome::Accepted(reading) => Ok((reading, Vec::new())),
            ValidationOutcome::Flagged(reading, warnings) => Ok((reading, warnings)),
            ValidationOutcome::Rejected(reason) => Err(reason),
        }
    }
}
