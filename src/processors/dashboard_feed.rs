use std::sync::Arc;
use tokio::sync::watch;

use crate::error::CycleError;
use crate::models::{ExtremaRecord, ProcessedSnapshot};

/// What a dashboard needs to render: the latest good snapshot (possibly
/// stale), the latest failure, and the current day's extremes.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub last_good: Option<Arc<ProcessedSnapshot>>,
    /// Cleared by the next successful cycle.
    pub last_error: Option<CycleError>,
    pub extrema: Option<Arc<ExtremaRecord>>,
    pub cycles: u64,
    pub failures: u64,
}

impl DashboardState {
    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Broadcasts pipeline results to any number of readers. Only the pipeline
/// publishes; every publish swaps the whole state.
#[derive(Debug)]
pub struct DashboardFeed {
    sender: watch::Sender<DashboardState>,
}

impl Default for DashboardFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(DashboardState::default());
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> DashboardState {
        self.sender.borrow().clone()
    }

    pub(crate) fn publish_snapshot(&self, snapshot: Arc<ProcessedSnapshot>) {
        self.sender.send_modify(|state| {
            state.extrema = Some(Arc::clone(&snapshot.extrema));
            state.last_good = Some(snapshot);
            state.last_error = None;
            state.cycles += 1;
        });
    }

    pub(crate) fn publish_error(&self, error: CycleError) {
        self.sender.send_modify(|state| {
            state.last_error = Some(error);
            state.cycles += 1;
            state.failures += 1;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    #[tokio::test]
    async fn test_subscribers_see_errors_without_losing_last_good() {
        let feed = DashboardFeed::new();
        let mut receiver = feed.subscribe();

        feed.publish_error(CycleError::Fetch(FetchError::RateLimited));
        receiver.changed().await.unwrap();

        let state = receiver.borrow_and_update().clone();
        assert!(state.last_good.is_none());
        assert!(state.is_stale());
        assert_eq!(state.cycles, 1);
        assert_eq!(state.failures, 1);
        assert_eq!(feed.current().failures, 1);
    }
}
