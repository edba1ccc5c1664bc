pub mod derived;
pub mod extrema;
pub mod reading;
pub mod snapshot;
pub mod validation;

pub use derived::{DerivedVariables, Radiation, Thermodynamics};
pub use extrema::{ExtremaRecord, Extreme, Extremes, TrackedVariable};
pub use reading::{Field, RawReading, RawReadingBuilder};
pub use snapshot::{DisplayValues, ProcessedSnapshot};
pub use validation::{RejectionReason, ValidationOutcome, Warning};
