pub mod constants;
pub mod progress;
pub mod units;

pub use constants::*;
pub use progress::{CycleTally, ProgressReporter};
pub use units::{convert, present, round_half_even, Quantity, Unit, UnitError, UnitSystem};
