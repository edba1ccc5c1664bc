use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use pws_processor::analyzers::DerivedCalculator;
use pws_processor::models::{Field, RawReading, RejectionReason, TrackedVariable, ValidationOutcome};
use pws_processor::processors::{ExtremaTracker, ReadingValidator};

fn reading(temperature: f64, humidity: f64, wind: f64) -> RawReading {
    RawReading::builder()
        .timestamp(Utc.with_ymd_and_hms(2024, 8, 15, 12, 0, 0).unwrap())
        .temperature(temperature)
        .humidity(humidity)
        .pressure(1010.0)
        .wind_speed(wind)
        .precipitation(0.0, 0.0)
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn heat_index_and_wind_chill_never_coexist(
        temperature in -60.0f64..60.0,
        humidity in 0.0f64..=100.0,
        wind in 0.0f64..150.0,
    ) {
        let derived = DerivedCalculator::default().derive(&reading(temperature, humidity, wind));
        prop_assert!(derived.heat_index.is_none() || derived.wind_chill.is_none());

        let apparent = derived.apparent_temperature.unwrap();
        let expected = derived.wind_chill.or(derived.heat_index).unwrap_or(temperature);
        prop_assert_eq!(apparent, expected);
    }

    #[test]
    fn derivation_is_idempotent(
        temperature in -40.0f64..50.0,
        humidity in 1.0f64..=100.0,
        wind in 0.0f64..80.0,
    ) {
        let calculator = DerivedCalculator::default();
        let raw = reading(temperature, humidity, wind);
        prop_assert_eq!(calculator.derive(&raw), calculator.derive(&raw));
    }

    #[test]
    fn dew_point_never_exceeds_temperature(
        temperature in -40.0f64..50.0,
        humidity in 1.0f64..=100.0,
    ) {
        let derived = DerivedCalculator::default().derive(&reading(temperature, humidity, 0.0));
        let dew_point = derived.dew_point.unwrap();
        prop_assert!(dew_point <= temperature + 1e-9);
    }

    #[test]
    fn humidity_outside_range_is_rejected_not_clamped(
        humidity in prop_oneof![-1000.0f64..-0.001, 100.001f64..1000.0],
    ) {
        let outcome = ReadingValidator::default().validate(reading(20.0, humidity, 5.0), None);
        match outcome {
            ValidationOutcome::Rejected(RejectionReason::OutOfRange { field, value, .. }) => {
                prop_assert_eq!(field, Field::Humidity);
                prop_assert_eq!(value, humidity);
            }
            other => prop_assert!(false, "expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn extrema_bound_every_value_of_the_day(
        values in prop::collection::vec(-30.0f64..45.0, 1..60),
    ) {
        let date = NaiveDate::from_ymd_opt(2024, 8, 15).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 8, 15, 0, 0, 0).unwrap();
        let mut tracker = ExtremaTracker::new();

        let mut previous: Option<(f64, f64)> = None;
        for (i, value) in values.iter().enumerate() {
            let at = start + Duration::minutes(i as i64);
            let update = tracker.update(date, at, &[(TrackedVariable::Temperature, *value)]);
            let extremes = *update.current.get(TrackedVariable::Temperature).unwrap();

            // bounds only ever widen
            if let Some((min, max)) = previous {
                prop_assert!(extremes.min.value <= min);
                prop_assert!(extremes.max.value >= max);
            }
            previous = Some((extremes.min.value, extremes.max.value));
        }

        let record = tracker.current().unwrap();
        let extremes = record.get(TrackedVariable::Temperature).unwrap();
        for value in &values {
            prop_assert!(extremes.contains(*value));
        }
        prop_assert_eq!(record.readings() as usize, values.len());
    }
}
