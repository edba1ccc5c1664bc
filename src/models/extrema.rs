use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::{DerivedVariables, RawReading};

/// Variables whose daily minimum and maximum are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedVariable {
    Temperature,
    Humidity,
    Pressure,
    DewPoint,
    ApparentTemperature,
    WindSpeed,
    WindGust,
    PrecipitationRate,
    SolarRadiation,
    UvIndex,
}

impl TrackedVariable {
    pub fn name(&self) -> &'static str {
        match self {
            TrackedVariable::Temperature => "temperature",
            TrackedVariable::Humidity => "humidity",
            TrackedVariable::Pressure => "pressure",
            TrackedVariable::DewPoint => "dew_point",
            TrackedVariable::ApparentTemperature => "apparent_temperature",
            TrackedVariable::WindSpeed => "wind_speed",
            TrackedVariable::WindGust => "wind_gust",
            TrackedVariable::PrecipitationRate => "precipitation_rate",
            TrackedVariable::SolarRadiation => "solar_radiation",
            TrackedVariable::UvIndex => "uv_index",
        }
    }

    /// Values present in a processed reading, in tracking order.
    pub fn observations(reading: &RawReading, derived: &DerivedVariables) -> Vec<(Self, f64)> {
        [
            (TrackedVariable::Temperature, reading.temperature),
            (TrackedVariable::Humidity, reading.humidity),
            (TrackedVariable::Pressure, reading.pressure),
            (TrackedVariable::DewPoint, derived.dew_point),
            (
                TrackedVariable::ApparentTemperature,
                derived.apparent_temperature,
            ),
            (TrackedVariable::WindSpeed, reading.wind_speed),
            (TrackedVariable::WindGust, reading.wind_gust),
            (TrackedVariable::PrecipitationRate, reading.precip_rate),
            (TrackedVariable::SolarRadiation, reading.solar_radiation),
            (TrackedVariable::UvIndex, reading.uv_index),
        ]
        .into_iter()
        .filter_map(|(variable, value)| value.map(|v| (variable, v)))
        .collect()
    }
}

impl fmt::Display for TrackedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extreme {
    pub value: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremes {
    pub min: Extreme,
    pub max: Extreme,
}

impl Extremes {
    pub fn new(value: f64, at: DateTime<Utc>) -> Self {
        let first = Extreme { value, at };
        Self {
            min: first,
            max: first,
        }
    }

    /// Strict comparison: a tie keeps the earlier timestamp.
    /// Returns whether either bound moved.
    pub fn observe(&mut self, value: f64, at: DateTime<Utc>) -> bool {
        let mut changed = false;
        if value < self.min.value {
            self.min = Extreme { value, at };
            changed = true;
        }
        if value > self.max.value {
            self.max = Extreme { value, at };
            changed = true;
        }
        changed
    }

    pub fn range(&self) -> f64 {
        self.max.value - self.min.value
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.value <= value && value <= self.max.value
    }
}

/// Running extremes for one local calendar day.
///
/// Records are only ever built by the extrema tracker; readers receive them
/// behind an `Arc` and never see a partially applied update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremaRecord {
    pub date: NaiveDate,
    variables: BTreeMap<TrackedVariable, Extremes>,
    readings: u32,
}

impl ExtremaRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            variables: BTreeMap::new(),
            readings: 0,
        }
    }

    pub fn get(&self, variable: TrackedVariable) -> Option<&Extremes> {
        self.variables.get(&variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackedVariable, &Extremes)> {
        self.variables.iter().map(|(variable, extremes)| (*variable, extremes))
    }

    /// Number of readings folded into this record.
    pub fn readings(&self) -> u32 {
        self.readings
    }

    pub fn is_empty(&self) -> bool {
        self.readings == 0
    }

    pub(crate) fn record(&mut self, values: &[(TrackedVariable, f64)], at: DateTime<Utc>) {
        for &(variable, value) in values {
            self.variables
                .entry(variable)
                .and_modify(|extremes| {
                    extremes.observe(value, at);
                })
                .or_insert_with(|| Extremes::new(value, at));
        }
        self.readings += 1;
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Extremes for {} ({} readings)",
            self.date, self.readings
        )];
        for (variable, extremes) in self.iter() {
            lines.push(format!(
                "  {:<22} min {:>8.1} at {}  max {:>8.1} at {}  range {:.1}",
                variable,
                extremes.min.value,
                extremes.min.at.format("%H:%M:%S"),
                extremes.max.value,
                extremes.max.at.format("%H:%M:%S"),
                extremes.range(),
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_extremes_tie_keeps_first_occurrence() {
        let mut extremes = Extremes::new(10.0, at(6, 0));
        assert!(extremes.observe(15.0, at(7, 0)));
        assert!(!extremes.observe(10.0, at(8, 0)));

        assert_eq!(extremes.min.at, at(6, 0));
        assert_eq!(extremes.max.value, 15.0);
        assert_eq!(extremes.range(), 5.0);
        assert!(extremes.contains(12.0));
    }

    #[test]
    fn test_record_skips_absent_variables() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut record = ExtremaRecord::new(date);
        assert!(record.is_empty());

        record.record(&[(TrackedVariable::Temperature, 4.0)], at(1, 0));
        record.record(
            &[
                (TrackedVariable::Temperature, 2.5),
                (TrackedVariable::WindGust, 30.0),
            ],
            at(2, 0),
        );

        assert_eq!(record.readings(), 2);
        let temperature = record.get(TrackedVariable::Temperature).unwrap();
        assert_eq!(temperature.min.value, 2.5);
        assert_eq!(temperature.max.value, 4.0);
        assert!(record.get(TrackedVariable::Humidity).is_none());
        assert_eq!(record.get(TrackedVariable::WindGust).unwrap().min.at, at(2, 0));
    }

    #[test]
    fn test_summary_shows_daily_range() {
        let mut record = ExtremaRecord::new(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        record.record(&[(TrackedVariable::Temperature, 3.5)], at(6, 0));
        record.record(&[(TrackedVariable::Temperature, 14.0)], at(15, 0));

        let summary = record.summary();
        assert!(summary.contains("(2 readings)"));
        assert!(summary.contains("range 10.5"), "{}", summary);
    }

    #[test]
    fn test_record_serializes_variable_names() {
        let mut record = ExtremaRecord::new(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        record.record(&[(TrackedVariable::DewPoint, 1.0)], at(3, 0));

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"dew_point\""));
        let back: ExtremaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
