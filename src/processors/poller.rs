use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::error::{CycleError, FetchError};
use crate::models::ProcessedSnapshot;
use crate::processors::ObservationPipeline;
use crate::readers::ReadingSource;
use crate::writers::ExtremaArchive;

pub type CycleOutcome = std::result::Result<Arc<ProcessedSnapshot>, CycleError>;

/// Drives `pipeline` every `period` until `shutdown` resolves or the source
/// runs dry. Each cycle is awaited to completion before the next tick, and
/// ticks missed while a cycle ran late are skipped. Returns the number of
/// cycles run.
pub async fn poll<S, A, F, C>(
    pipeline: &mut ObservationPipeline<S, A>,
    period: Duration,
    shutdown: F,
    mut on_cycle: C,
) -> u64
where
    S: ReadingSource,
    A: ExtremaArchive,
    F: Future<Output = ()>,
    C: FnMut(&CycleOutcome),
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(cycles, "shutdown requested, stopping poller");
                break;
            }
            _ = ticker.tick() => {
                let outcome = pipeline.run_cycle().await;
                cycles += 1;
                on_cycle(&outcome);

                if matches!(outcome, Err(CycleError::Fetch(FetchError::Exhausted))) {
                    info!(cycles, "source exhausted, stopping poller");
                    break;
                }
            }
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawReading;
    use crate::readers::ReplaySource;
    use crate::settings::Settings;
    use crate::writers::MemoryArchive;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    #[tokio::test]
    async fn test_polls_until_source_is_exhausted() {
        let start = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let readings = (0..3).map(|i| {
            RawReading::builder()
                .timestamp(start + ChronoDuration::seconds(30 * i))
                .temperature(8.0)
                .humidity(80.0)
                .pressure(1009.0)
                .wind_speed(2.0)
                .precipitation(0.0, 0.0)
                .build()
                .unwrap()
        });
        let mut pipeline = ObservationPipeline::new(
            ReplaySource::from_readings(readings),
            MemoryArchive::new(),
            &Settings::default(),
        )
        .unwrap();

        let mut successes = 0;
        let cycles = poll(
            &mut pipeline,
            Duration::from_millis(5),
            std::future::pending(),
            |outcome| {
                if outcome.is_ok() {
                    successes += 1;
                }
            },
        )
        .await;

        assert_eq!(cycles, 4);
        assert_eq!(successes, 3);
        assert_eq!(pipeline.extrema().unwrap().readings(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let mut pipeline = ObservationPipeline::new(
            ReplaySource::from_readings(Vec::new()),
            MemoryArchive::new(),
            &Settings::default(),
        )
        .unwrap();

        let cycles = poll(
            &mut pipeline,
            Duration::from_secs(60),
            std::future::ready(()),
            |_| {},
        )
        .await;
        assert!(cycles <= 1);
    }
}
