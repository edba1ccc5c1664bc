use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::analyzers::{DerivedCalculator, PressureHistory, RainGauge, RainIntensity, RainRates};
use crate::error::{CycleError, Result};
use crate::models::{
    DisplayValues, ExtremaRecord, ProcessedSnapshot, RawReading, TrackedVariable,
};
use crate::processors::{
    DashboardFeed, DashboardState, ExtremaTracker, ReadingValidator, TrackerUpdate,
};
use crate::readers::ReadingSource;
use crate::settings::Settings;
use crate::utils::units::UnitSystem;
use crate::writers::ExtremaArchive;

/// Turns raw readings into snapshots, one cycle at a time.
///
/// The pipeline owns all mutable state (previous reading, pressure and rain
/// history, daily extremes) and is driven by a single caller, so at most one cycle is
/// ever in flight. A rejected or failed cycle leaves that state untouched.
pub struct ObservationPipeline<S, A> {
    source: S,
    archive: A,
    validator: ReadingValidator,
    calculator: DerivedCalculator,
    tracker: ExtremaTracker,
    pressure_history: PressureHistory,
    rain_gauge: RainGauge,
    previous: Option<RawReading>,
    timezone: Tz,
    unit_system: UnitSystem,
    fetch_timeout: Duration,
    feed: DashboardFeed,
}

impl<S: ReadingSource, A: ExtremaArchive> ObservationPipeline<S, A> {
    pub fn new(source: S, archive: A, settings: &Settings) -> Result<Self> {
        settings.check()?;

        Ok(Self {
            source,
            archive,
            validator: ReadingValidator::new(settings.glitch_thresholds()),
            calculator: DerivedCalculator::new(settings.derivation.clone())
                .with_altitude(settings.station.altitude_m),
            tracker: ExtremaTracker::new(),
            pressure_history: PressureHistory::new(),
            rain_gauge: RainGauge::new(),
            previous: None,
            timezone: settings.timezone()?,
            unit_system: settings.unit_system,
            fetch_timeout: settings.fetch_timeout(),
            feed: DashboardFeed::new(),
        })
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Fetch one reading, bounded by the fetch timeout, and process it.
    pub async fn run_cycle(&mut self) -> std::result::Result<Arc<ProcessedSnapshot>, CycleError> {
        let fetched = match timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(reading)) => reading,
            Ok(Err(e)) => return Err(self.fail(CycleError::Fetch(e))),
            Err(_) => return Err(self.fail(CycleError::Timeout(self.fetch_timeout))),
        };
        self.process(fetched)
    }

    /// Validate, derive, track and publish one reading.
    pub fn process(
        &mut self,
        reading: RawReading,
    ) -> std::result::Result<Arc<ProcessedSnapshot>, CycleError> {
        let (reading, warnings) = match self
            .validator
            .validate(reading, self.previous.as_ref())
            .into_result()
        {
            Ok(accepted) => accepted,
            Err(reason) => {
                warn!(%reason, "reading rejected");
                return Err(self.fail(CycleError::Rejected(reason)));
            }
        };
        for warning in &warnings {
            warn!(timestamp = %reading.timestamp, %warning, "reading flagged");
        }

        let derived = self.calculator.derive(&reading);
        let local_date = reading.local_date(&self.timezone);
        let observations = TrackedVariable::observations(&reading, &derived);
        let update = self
            .tracker
            .prepare(local_date, reading.timestamp, &observations);

        let mut pressure_history = self.pressure_history.clone();
        if let Some(pressure) = reading.pressure {
            pressure_history.push(reading.timestamp, pressure);
        }
        let mut rain_gauge = self.rain_gauge.clone();
        let rain_rates = match reading.precip_total {
            Some(total) => rain_gauge.push(reading.timestamp, total),
            None => RainRates::default(),
        };

        let snapshot = Arc::new(ProcessedSnapshot {
            local_date,
            pressure_trend: pressure_history.trend(),
            rain_intensity: reading.precip_rate.and_then(RainIntensity::classify),
            rain_rates,
            display: DisplayValues::new(&reading, &derived, self.unit_system),
            extrema: Arc::clone(&update.current),
            warnings,
            derived,
            reading,
        });

        // commit
        self.tracker.commit(&update);
        self.pressure_history = pressure_history;
        self.rain_gauge = rain_gauge;
        self.previous = Some(snapshot.reading.clone());

        self.archive_finalized(&update);
        self.feed.publish_snapshot(Arc::clone(&snapshot));

        info!(
            timestamp = %snapshot.reading.timestamp,
            local_date = %snapshot.local_date,
            temperature = ?snapshot.reading.temperature,
            apparent = ?snapshot.derived.apparent_temperature,
            flagged = snapshot.is_flagged(),
            "snapshot ready"
        );
        Ok(snapshot)
    }

    fn archive_finalized(&mut self, update: &TrackerUpdate) {
        let Some(finalized) = &update.finalized else {
            return;
        };
        if finalized.is_empty() {
            debug!(date = %finalized.date, "nothing to archive");
            return;
        }
        if let Err(e) = self.archive.archive(finalized) {
            warn!(date = %finalized.date, error = %e, "failed to archive daily extremes");
        }
    }

    fn fail(&self, error: CycleError) -> CycleError {
        if !error.is_rejection() {
            warn!(source = %self.source.describe(), %error, "cycle failed");
        }
        self.feed.publish_error(error.clone());
        error
    }

    pub fn extrema(&self) -> Option<Arc<ExtremaRecord>> {
        self.tracker.current()
    }

    pub fn previous(&self) -> Option<&RawReading> {
        self.previous.as_ref()
    }

    pub fn pressure_history(&self) -> &PressureHistory {
        &self.pressure_history
    }

    pub fn rain_gauge(&self) -> &RainGauge {
        &self.rain_gauge
    }

    pub fn feed(&self) -> &DashboardFeed {
        &self.feed
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.feed.subscribe()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::RejectionReason;
    use crate::readers::ReplaySource;
    use crate::writers::MemoryArchive;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0).unwrap() + ChronoDuration::minutes(minutes)
    }

    fn reading(minutes: i64, temperature: f64) -> RawReading {
        RawReading::builder()
            .timestamp(at(minutes))
            .temperature(temperature)
            .humidity(65.0)
            .pressure(1016.0)
            .wind(3.0, 45.0)
            .precipitation(0.0, 0.0)
            .build()
            .unwrap()
    }

    fn pipeline(readings: Vec<RawReading>) -> ObservationPipeline<ReplaySource, MemoryArchive> {
        ObservationPipeline::new(
            ReplaySource::from_readings(readings),
            MemoryArchive::new(),
            &Settings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_process_builds_snapshot() {
        let mut pipeline = pipeline(vec![]);
        let snapshot = pipeline.process(reading(0, 12.0)).unwrap();

        assert_eq!(snapshot.derived.apparent_temperature, Some(12.0));
        assert_eq!(snapshot.rain_intensity, Some(RainIntensity::Dry));
        assert!(snapshot.pressure_trend.is_none());
        assert_eq!(snapshot.extrema.readings(), 1);
        assert_eq!(pipeline.extrema().unwrap(), snapshot.extrema);
    }

    #[test]
    fn test_rejection_leaves_state_unchanged() {
        let mut pipeline = pipeline(vec![]);
        pipeline.process(reading(10, 12.0)).unwrap();
        let extrema_before = pipeline.extrema().unwrap();

        let err = pipeline.process(reading(5, -20.0)).unwrap_err();
        assert!(matches!(
            err,
            CycleError::Rejected(RejectionReason::OutOfOrder { .. })
        ));
        assert!(Arc::ptr_eq(&pipeline.extrema().unwrap(), &extrema_before));
        assert_eq!(pipeline.previous().unwrap().timestamp, at(10));
        assert_eq!(pipeline.pressure_history().len(), 1);

        let state = pipeline.feed().current();
        assert_eq!(state.failures, 1);
        assert!(state.last_good.is_some());
    }

    #[test]
    fn test_pressure_trend_after_two_readings() {
        let mut pipeline = pipeline(vec![]);
        pipeline.process(reading(0, 12.0)).unwrap();

        let mut later = reading(60, 12.5);
        later.pressure = Some(1014.5);
        let snapshot = pipeline.process(later).unwrap();

        let trend = snapshot.pressure_trend.unwrap();
        assert!((trend.change - -1.5).abs() < 1e-9);
    }

    #[test]
    fn test_rain_rates_follow_accumulation() {
        let mut pipeline = pipeline(vec![]);
        pipeline.process(reading(0, 12.0)).unwrap();

        let mut first_tip = reading(1, 12.0);
        first_tip.precip_total = Some(0.2);
        let snapshot = pipeline.process(first_tip).unwrap();
        assert_eq!(snapshot.rain_rates.instantaneous, Some(0.4));

        let mut second_tip = reading(2, 12.0);
        second_tip.precip_total = Some(0.4);
        let snapshot = pipeline.process(second_tip).unwrap();
        // 0.2 mm in one minute
        assert!((snapshot.rain_rates.instantaneous.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(pipeline.rain_gauge().len(), 2);

        // a rejected reading does not touch the gauge
        let mut stale = reading(1, 12.0);
        stale.precip_total = Some(5.0);
        assert!(pipeline.process(stale).is_err());
        assert_eq!(pipeline.rain_gauge().len(), 2);
    }

    #[tokio::test]
    async fn test_run_cycle_reports_exhausted_source() {
        let mut pipeline = pipeline(vec![reading(0, 12.0)]);
        assert!(pipeline.run_cycle().await.is_ok());

        let err = pipeline.run_cycle().await.unwrap_err();
        assert_eq!(err, CycleError::Fetch(FetchError::Exhausted));

        let state = pipeline.feed().current();
        assert_eq!(state.cycles, 2);
        assert_eq!(state.last_error, Some(err));
    }
}
