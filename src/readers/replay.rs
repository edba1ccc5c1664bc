use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{FetchError, Result};
use crate::models::RawReading;
use crate::readers::ReadingSource;
use crate::utils::units::{to_metric, Quantity, UnitSystem};

/// Replays recorded readings in file order, one per fetch.
///
/// Expects a CSV with a header row naming the reading fields
/// (`timestamp,temperature,humidity,...`). Timestamps are RFC 3339; empty
/// cells are absent values.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    origin: String,
    readings: VecDeque<RawReading>,
}

impl ReplaySource {
    pub fn from_readings(readings: impl IntoIterator<Item = RawReading>) -> Self {
        Self {
            origin: "in-memory readings".to_string(),
            readings: readings.into_iter().collect(),
        }
    }

    pub fn from_csv_path(path: &Path, units: UnitSystem) -> Result<Self> {
        let file = File::open(path)?;
        let mut source = Self::from_reader(file, units)?;
        source.origin = PathBuf::from(path).display().to_string();
        Ok(source)
    }

    /// `units` names the unit system the recording was made in; values are
    /// converted to metric on load.
    pub fn from_reader<R: Read>(reader: R, units: UnitSystem) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut readings = VecDeque::new();
        for record in csv_reader.deserialize::<RawReading>() {
            let reading = record?;
            readings.push_back(match units {
                UnitSystem::Metric => reading,
                UnitSystem::Imperial => imperial_to_metric(reading),
            });
        }

        debug!(count = readings.len(), "loaded replay readings");
        Ok(Self {
            origin: "csv reader".to_string(),
            readings,
        })
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

fn imperial_to_metric(mut reading: RawReading) -> RawReading {
    let system = UnitSystem::Imperial;
    let metric = |value: Option<f64>, quantity| value.map(|v| to_metric(v, system.unit_for(quantity)));

    reading.temperature = metric(reading.temperature, Quantity::Temperature);
    reading.pressure = metric(reading.pressure, Quantity::Pressure);
    reading.wind_speed = metric(reading.wind_speed, Quantity::Speed);
    reading.wind_gust = metric(reading.wind_gust, Quantity::Speed);
    reading.precip_rate = metric(reading.precip_rate, Quantity::PrecipitationRate);
    reading.precip_total = metric(reading.precip_total, Quantity::Precipitation);
    reading
}

impl ReadingSource for ReplaySource {
    async fn fetch(&mut self) -> std::result::Result<RawReading, FetchError> {
        self.readings.pop_front().ok_or(FetchError::Exhausted)
    }

    fn describe(&self) -> String {
        format!("replay of {}", self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
timestamp,temperature,humidity,pressure,wind_speed,wind_direction,wind_gust,precip_rate,precip_total,solar_radiation,uv_index
2024-07-01T10:00:00Z,21.5,55,1015.2,6.0,200,9.5,0,0,640,6
2024-07-01T10:00:30Z,21.6,55,1015.2,7.0,,,0,0,,
";

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let mut source = ReplaySource::from_reader(CSV.as_bytes(), UnitSystem::Metric).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.fetch().await.unwrap();
        assert_eq!(first.temperature, Some(21.5));
        assert_eq!(first.solar_radiation, Some(640.0));

        let second = source.fetch().await.unwrap();
        assert!(second.timestamp > first.timestamp);
        assert_eq!(second.wind_direction, None);
        assert_eq!(second.uv_index, None);

        assert_eq!(source.fetch().await, Err(FetchError::Exhausted));
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_imperial_recording_is_converted() {
        let csv = "\
timestamp,temperature,humidity,pressure,wind_speed,precip_rate,precip_total
2024-07-01T10:00:00Z,68.0,50,29.92,10.0,0.1,1.0
";
        let mut source = ReplaySource::from_reader(csv.as_bytes(), UnitSystem::Imperial).unwrap();
        let reading = source.fetch().await.unwrap();

        assert!((reading.temperature.unwrap() - 20.0).abs() < 1e-9);
        assert!((reading.pressure.unwrap() - 1013.2).abs() < 0.1);
        assert!((reading.wind_speed.unwrap() - 16.09).abs() < 0.01);
        assert!((reading.precip_total.unwrap() - 25.4).abs() < 1e-9);
        assert_eq!(reading.humidity, Some(50.0));
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let csv = "timestamp,temperature\nyesterday,20.0\n";
        assert!(ReplaySource::from_reader(csv.as_bytes(), UnitSystem::Metric).is_err());
    }
}
