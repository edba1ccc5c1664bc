use std::future::Future;

use crate::error::FetchError;
use crate::models::RawReading;

/// Anything that can produce the station's current reading, already in
/// metric units.
///
/// The pipeline enforces its own timeout around `fetch`; implementations
/// need not.
pub trait ReadingSource: Send {
    fn fetch(&mut self) -> impl Future<Output = Result<RawReading, FetchError>> + Send;

    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;
}
