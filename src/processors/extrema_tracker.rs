use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{error, info};

use crate::models::{ExtremaRecord, TrackedVariable};

/// Result of folding one reading into the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerUpdate {
    pub current: Arc<ExtremaRecord>,
    /// The previous day's record, present only on the reading that crossed
    /// local midnight.
    pub finalized: Option<Arc<ExtremaRecord>>,
}

/// Running daily extremes keyed on the station-local date.
///
/// Each update publishes a fresh record; handed-out `Arc`s never change
/// under their holders.
#[derive(Debug, Default)]
pub struct ExtremaTracker {
    current: Option<Arc<ExtremaRecord>>,
}

impl ExtremaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<ExtremaRecord>> {
        self.current.clone()
    }

    /// Computes the update without applying it. The pipeline commits with
    /// [`ExtremaTracker::commit`] once every fallible step has succeeded.
    pub fn prepare(
        &self,
        local_date: NaiveDate,
        at: DateTime<Utc>,
        values: &[(TrackedVariable, f64)],
    ) -> TrackerUpdate {
        match &self.current {
            Some(current) if local_date < current.date => {
                // Validation guarantees monotonic timestamps, so this is a
                // timezone change or a clock problem.
                error!(
                    %local_date,
                    current = %current.date,
                    "reading belongs to an earlier day; extremes unchanged"
                );
                TrackerUpdate {
                    current: Arc::clone(current),
                    finalized: None,
                }
            }
            Some(current) if local_date == current.date => {
                let mut next = ExtremaRecord::clone(current);
                next.record(values, at);
                TrackerUpdate {
                    current: Arc::new(next),
                    finalized: None,
                }
            }
            previous => {
                let mut fresh = ExtremaRecord::new(local_date);
                fresh.record(values, at);
                TrackerUpdate {
                    current: Arc::new(fresh),
                    finalized: previous.clone(),
                }
            }
        }
    }

    pub fn commit(&mut self, update: &TrackerUpdate) {
        if let Some(finalized) = &update.finalized {
            info!(
                date = %finalized.date,
                readings = finalized.readings(),
                next = %update.current.date,
                "daily extremes finalized"
            );
        }
        self.current = Some(Arc::clone(&update.current));
    }

    pub fn update(
        &mut self,
        local_date: NaiveDate,
        at: DateTime<Utc>,
        values: &[(TrackedVariable, f64)],
    ) -> TrackerUpdate {
        let update = self.prepare(local_date, at, values);
        self.commit(&update);
        update
    }
}
