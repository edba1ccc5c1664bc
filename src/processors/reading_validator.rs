use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Field, RawReading, RejectionReason, ValidationOutcome, Warning};
use crate::utils::constants::{
    DEFAULT_HUMIDITY_JUMP, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PRESSURE_JUMP, DEFAULT_TEMP_JUMP,
    MAX_HUMIDITY, MAX_VALID_TEMP, MAX_WIND_DIRECTION, MIN_HUMIDITY, MIN_VALID_TEMP,
};

/// Physically possible range per field. Anything outside is rejected.
fn physical_range(field: Field) -> (f64, f64) {
    match field {
        Field::Temperature => (MIN_VALID_TEMP, MAX_VALID_TEMP),
        Field::Humidity => (MIN_HUMIDITY, MAX_HUMIDITY),
        Field::WindDirection => (0.0, MAX_WIND_DIRECTION),
        Field::Pressure
        | Field::WindSpeed
        | Field::WindGust
        | Field::PrecipRate
        | Field::PrecipTotal
        | Field::SolarRadiation
        | Field::UvIndex => (0.0, f64::INFINITY),
    }
}

/// Largest plausible change between consecutive accepted readings, per
/// `window_secs`. Longer gaps allow proportionally more change. Without an
/// explicit window the poll interval is used (see [`Self::with_default_window`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GlitchThresholds {
    /// °C
    #[validate(range(min = 0.1, max = 50.0))]
    pub temperature: f64,

    /// percentage points
    #[validate(range(min = 1.0, max = 100.0))]
    pub humidity: f64,

    /// hPa
    #[validate(range(min = 0.1, max = 100.0))]
    pub pressure: f64,

    #[validate(range(min = 1, max = 86400))]
    pub window_secs: Option<u64>,
}

impl Default for GlitchThresholds {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMP_JUMP,
            humidity: DEFAULT_HUMIDITY_JUMP,
            pressure: DEFAULT_PRESSURE_JUMP,
            window_secs: None,
        }
    }
}

impl GlitchThresholds {
    /// Fill in the window when the configuration left it open.
    pub fn with_default_window(mut self, secs: u64) -> Self {
        self.window_secs.get_or_insert(secs);
        self
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs.unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
    }

    fn limit(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => Some(self.temperature),
            Field::Humidity => Some(self.humidity),
            Field::Pressure => Some(self.pressure),
            _ => None,
        }
    }
}

/// Decides whether a reading may enter the pipeline. Holds configuration
/// only; the previous accepted reading is supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ReadingValidator {
    thresholds: GlitchThresholds,
}

impl ReadingValidator {
    pub fn new(thresholds: GlitchThresholds) -> Self {
        Self { thresholds }
    }

    pub fn validate(&self, reading: RawReading, previous: Option<&RawReading>) -> ValidationOutcome {
        if let Some(field) = reading.missing_required().into_iter().next() {
            return ValidationOutcome::Rejected(RejectionReason::MissingField(field));
        }

        if let Some(reason) = Self::check_ranges(&reading) {
            return ValidationOutcome::Rejected(reason);
        }

        let Some(previous) = previous else {
            return ValidationOutcome::Accepted(reading);
        };

        if reading.timestamp == previous.timestamp {
            return ValidationOutcome::Rejected(RejectionReason::Duplicate {
                timestamp: reading.timestamp,
            });
        }
        if reading.timestamp < previous.timestamp {
            return ValidationOutcome::Rejected(RejectionReason::OutOfOrder {
                timestamp: reading.timestamp,
                previous: previous.timestamp,
            });
        }

        let warnings = self.detect_glitches(&reading, previous);
        if warnings.is_empty() {
            ValidationOutcome::Accepted(reading)
        } else {
            ValidationOutcome::Flagged(reading, warnings)
        }
    }

    /// First value outside its physical range, if any. Absent fields pass.
    pub fn check_ranges(reading: &RawReading) -> Option<RejectionReason> {
        Field::ALL.into_iter().find_map(|field| {
            let value = reading.value(field)?;
            let (min, max) = physical_range(field);
            // open-ended ranges would otherwise admit +inf
            if value.is_finite() && (min..=max).contains(&value) {
                None
            } else {
                Some(RejectionReason::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                })
            }
        })
    }

    fn detect_glitches(&self, reading: &RawReading, previous: &RawReading) -> Vec<Warning> {
        let elapsed = (reading.timestamp - previous.timestamp).num_milliseconds() as f64 / 1000.0;
        let windows = (elapsed / self.thresholds.window_secs() as f64).max(1.0);

        [Field::Temperature, Field::Humidity, Field::Pressure]
            .into_iter()
            .filter_map(|field| {
                let threshold = self.thresholds.limit(field)?;
                let current = reading.value(field)?;
                let before = previous.value(field)?;
                let limit = threshold * windows;

                ((current - before).abs() > limit).then_some(Warning::SuddenChange {
                    field,
                    previous: before,
                    current,
                    limit,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap()
    }

    fn reading_at(timestamp: DateTime<Utc>, temperature: f64) -> RawReading {
        RawReading::builder()
            .timestamp(timestamp)
            .temperature(temperature)
            .humidity(60.0)
            .pressure(1012.0)
            .wind(8.0, 90.0)
            .precipitation(0.0, 0.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_reading_accepted() {
        let validator = ReadingValidator::default();
        let outcome = validator.validate(reading_at(t0(), 18.0), None);
        assert!(matches!(outcome, ValidationOutcome::Accepted(_)));
    }

    #[test]
    fn test_humidity_out_of_range_rejected_not_clamped() {
        let validator = ReadingValidator::default();
        let mut reading = reading_at(t0(), 18.0);
        reading.humidity = Some(100.1);

        match validator.validate(reading, None) {
            ValidationOutcome::Rejected(RejectionReason::OutOfRange { field, value, .. }) => {
                assert_eq!(field, Field::Humidity);
                assert_eq!(value, 100.1);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_quantities_rejected() {
        let validator = ReadingValidator::default();
        for field in [Field::Pressure, Field::WindSpeed, Field::PrecipRate, Field::PrecipTotal] {
            let mut reading = reading_at(t0(), 18.0);
            match field {
                Field::Pressure => reading.pressure = Some(-1.0),
                Field::WindSpeed => reading.wind_speed = Some(-0.5),
                Field::PrecipRate => reading.precip_rate = Some(-0.1),
                _ => reading.precip_total = Some(-2.0),
            }
            assert!(validator.validate(reading, None).is_rejected(), "{}", field);
        }
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let validator = ReadingValidator::default();
        let mut reading = reading_at(t0(), 18.0);
        reading.temperature = Some(f64::NAN);
        assert!(validator.validate(reading, None).is_rejected());
    }

    #[test]
    fn test_infinity_rejected_for_open_ended_fields() {
        let validator = ReadingValidator::default();
        let open_ended = [
            Field::Pressure,
            Field::WindSpeed,
            Field::WindGust,
            Field::PrecipRate,
            Field::PrecipTotal,
            Field::SolarRadiation,
            Field::UvIndex,
        ];
        for field in open_ended {
            let mut reading = reading_at(t0(), 18.0);
            match field {
                Field::Pressure => reading.pressure = Some(f64::INFINITY),
                Field::WindSpeed => reading.wind_speed = Some(f64::INFINITY),
                Field::WindGust => reading.wind_gust = Some(f64::INFINITY),
                Field::PrecipRate => reading.precip_rate = Some(f64::INFINITY),
                Field::PrecipTotal => reading.precip_total = Some(f64::INFINITY),
                Field::SolarRadiation => reading.solar_radiation = Some(f64::INFINITY),
                _ => reading.uv_index = Some(f64::INFINITY),
            }

            match validator.validate(reading, None) {
                ValidationOutcome::Rejected(RejectionReason::OutOfRange { field: f, .. }) => {
                    assert_eq!(f, field)
                }
                other => panic!("{}: expected rejection, got {:?}", field, other),
            }
        }

        let mut reading = reading_at(t0(), 18.0);
        reading.temperature = Some(f64::NEG_INFINITY);
        assert!(validator.validate(reading, None).is_rejected());
    }

    #[test]
    fn test_missing_required_field() {
        let validator = ReadingValidator::default();
        let mut reading = reading_at(t0(), 18.0);
        reading.pressure = None;

        assert_eq!(
            validator.validate(reading, None),
            ValidationOutcome::Rejected(RejectionReason::MissingField(Field::Pressure))
        );
    }

    #[test]
    fn test_optional_fields_tolerated() {
        let validator = ReadingValidator::default();
        let mut reading = reading_at(t0(), 18.0);
        reading.wind_direction = None;
        reading.solar_radiation = None;
        reading.uv_index = None;
        assert!(!validator.validate(reading, None).is_rejected());
    }

    #[test]
    fn test_out_of_order_and_duplicate() {
        let validator = ReadingValidator::default();
        let previous = reading_at(t0(), 18.0);

        let earlier = reading_at(t0() - Duration::seconds(30), 18.0);
        assert!(matches!(
            validator.validate(earlier, Some(&previous)),
            ValidationOutcome::Rejected(RejectionReason::OutOfOrder { .. })
        ));

        let same = reading_at(t0(), 18.0);
        assert!(matches!(
            validator.validate(same, Some(&previous)),
            ValidationOutcome::Rejected(RejectionReason::Duplicate { .. })
        ));
    }

    #[test]
    fn test_sudden_jump_is_flagged_but_kept() {
        let validator = ReadingValidator::default();
        let previous = reading_at(t0(), 18.0);
        let jump = reading_at(t0() + Duration::seconds(30), 26.0);

        let outcome = validator.validate(jump, Some(&previous));
        assert!(outcome.is_flagged());
        assert_eq!(outcome.reading().unwrap().temperature, Some(26.0));
        assert!(matches!(
            outcome.warnings(),
            [Warning::SuddenChange {
                field: Field::Temperature,
                ..
            }]
        ));
    }

    #[test]
    fn test_long_gap_scales_allowed_change() {
        let validator = ReadingValidator::default();
        let previous = reading_at(t0(), 18.0);
        // 8 °C over ten minutes is within 5 °C per 30 s window
        let later = reading_at(t0() + Duration::minutes(10), 26.0);

        assert!(matches!(
            validator.validate(later, Some(&previous)),
            ValidationOutcome::Accepted(_)
        ));
    }

    #[test]
    fn test_thresholds_validate() {
        assert!(GlitchThresholds::default().validate().is_ok());
        let bad = GlitchThresholds {
            window_secs: Some(0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_window_follows_poll_interval_unless_set() {
        let open = GlitchThresholds::default().with_default_window(300);
        assert_eq!(open.window_secs(), 300);

        let pinned = GlitchThresholds {
            window_secs: Some(60),
            ..Default::default()
        }
        .with_default_window(300);
        assert_eq!(pinned.window_secs(), 60);

        // 20 °C in one five-minute poll is still a glitch
        let validator = ReadingValidator::new(open);
        let previous = reading_at(t0(), 10.0);
        let jump = reading_at(t0() + Duration::seconds(300), 30.0);
        assert!(validator.validate(jump, Some(&previous)).is_flagged());
    }
}
