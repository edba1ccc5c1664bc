//! Metric/imperial conversions for the measured quantities.
//!
//! Readings travel through the pipeline in metric units at full `f64`
//! precision. Rounding (half-to-even) happens once, when presentation values
//! are built for a snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const FAHRENHEIT_PER_CELSIUS: f64 = 9.0 / 5.0;
const FAHRENHEIT_OFFSET: f64 = 32.0;
const KELVIN_OFFSET: f64 = 273.15;
const HPA_PER_INHG: f64 = 33.863_886_666_667;
const HPA_PER_MMHG: f64 = 1.333_223_874_15;
const HPA_PER_KPA: f64 = 10.0;
const KMH_PER_MPH: f64 = 1.609_344;
const KMH_PER_MS: f64 = 3.6;
const KMH_PER_KNOT: f64 = 1.852;
const MM_PER_INCH: f64 = 25.4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unsupported unit: '{0}'")]
    UnsupportedUnit(String),

    #[error("cannot convert {from} to {to}")]
    IncompatibleUnits { from: Unit, to: Unit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Temperature,
    Pressure,
    Speed,
    Precipitation,
    PrecipitationRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Celsius,
    Fahrenheit,
    Kelvin,
    Hectopascal,
    Millibar,
    Kilopascal,
    InchOfMercury,
    MillimetreOfMercury,
    KilometrePerHour,
    MilePerHour,
    MetrePerSecond,
    Knot,
    Millimetre,
    Inch,
    MillimetrePerHour,
    InchPerHour,
}

impl Unit {
    pub fn quantity(&self) -> Quantity {
        match self {
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => Quantity::Temperature,
            Unit::Hectopascal
            | Unit::Millibar
            | Unit::Kilopascal
            | Unit::InchOfMercury
            | Unit::MillimetreOfMercury => Quantity::Pressure,
            Unit::KilometrePerHour | Unit::MilePerHour | Unit::MetrePerSecond | Unit::Knot => {
                Quantity::Speed
            }
            Unit::Millimetre | Unit::Inch => Quantity::Precipitation,
            Unit::MillimetrePerHour | Unit::InchPerHour => Quantity::PrecipitationRate,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            Unit::Kelvin => "K",
            Unit::Hectopascal => "hPa",
            Unit::Millibar => "mbar",
            Unit::Kilopascal => "kPa",
            Unit::InchOfMercury => "inHg",
            Unit::MillimetreOfMercury => "mmHg",
            Unit::KilometrePerHour => "km/h",
            Unit::MilePerHour => "mph",
            Unit::MetrePerSecond => "m/s",
            Unit::Knot => "kn",
            Unit::Millimetre => "mm",
            Unit::Inch => "in",
            Unit::MillimetrePerHour => "mm/h",
            Unit::InchPerHour => "in/h",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "c" | "°c" | "degc" | "celsius" => Unit::Celsius,
            "f" | "°f" | "degf" | "fahrenheit" => Unit::Fahrenheit,
            "k" | "kelvin" => Unit::Kelvin,
            "hpa" => Unit::Hectopascal,
            "mbar" | "mb" => Unit::Millibar,
            "kpa" => Unit::Kilopascal,
            "inhg" => Unit::InchOfMercury,
            "mmhg" => Unit::MillimetreOfMercury,
            "km/h" | "kmh" | "kph" => Unit::KilometrePerHour,
            "mph" => Unit::MilePerHour,
            "m/s" | "ms" => Unit::MetrePerSecond,
            "kn" | "kt" | "knot" | "knots" => Unit::Knot,
            "mm" => Unit::Millimetre,
            "in" | "inch" | "inches" => Unit::Inch,
            "mm/h" | "mmh" => Unit::MillimetrePerHour,
            "in/h" | "inh" => Unit::InchPerHour,
            _ => return Err(UnitError::UnsupportedUnit(s.to_string())),
        };
        Ok(unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// The unit this system displays a quantity in.
    pub fn unit_for(&self, quantity: Quantity) -> Unit {
        match (self, quantity) {
            (UnitSystem::Metric, Quantity::Temperature) => Unit::Celsius,
            (UnitSystem::Metric, Quantity::Pressure) => Unit::Hectopascal,
            (UnitSystem::Metric, Quantity::Speed) => Unit::KilometrePerHour,
            (UnitSystem::Metric, Quantity::Precipitation) => Unit::Millimetre,
            (UnitSystem::Metric, Quantity::PrecipitationRate) => Unit::MillimetrePerHour,
            (UnitSystem::Imperial, Quantity::Temperature) => Unit::Fahrenheit,
            (UnitSystem::Imperial, Quantity::Pressure) => Unit::InchOfMercury,
            (UnitSystem::Imperial, Quantity::Speed) => Unit::MilePerHour,
            (UnitSystem::Imperial, Quantity::Precipitation) => Unit::Inch,
            (UnitSystem::Imperial, Quantity::PrecipitationRate) => Unit::InchPerHour,
        }
    }

    /// Decimal places shown for a quantity in this system.
    pub fn presentation_decimals(&self, quantity: Quantity) -> u32 {
        match (self, quantity) {
            (UnitSystem::Imperial, Quantity::Pressure)
            | (UnitSystem::Imperial, Quantity::Precipitation)
            | (UnitSystem::Imperial, Quantity::PrecipitationRate) => 2,
            _ => 1,
        }
    }
}

impl FromStr for UnitSystem {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "si" => Ok(UnitSystem::Metric),
            "imperial" | "us" => Ok(UnitSystem::Imperial),
            _ => Err(UnitError::UnsupportedUnit(s.to_string())),
        }
    }
}

/// Express `value`, given in `unit`, in the metric unit of the same quantity.
pub fn to_metric(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Celsius
        | Unit::Hectopascal
        | Unit::Millibar
        | Unit::KilometrePerHour
        | Unit::Millimetre
        | Unit::MillimetrePerHour => value,
        Unit::Fahrenheit => (value - FAHRENHEIT_OFFSET) / FAHRENHEIT_PER_CELSIUS,
        Unit::Kelvin => value - KELVIN_OFFSET,
        Unit::Kilopascal => value * HPA_PER_KPA,
        Unit::InchOfMercury => value * HPA_PER_INHG,
        Unit::MillimetreOfMercury => value * HPA_PER_MMHG,
        Unit::MilePerHour => value * KMH_PER_MPH,
        Unit::MetrePerSecond => value * KMH_PER_MS,
        Unit::Knot => value * KMH_PER_KNOT,
        Unit::Inch | Unit::InchPerHour => value * MM_PER_INCH,
    }
}

/// Express `value`, given in `unit`, in the imperial unit of the same quantity.
pub fn to_imperial(value: f64, unit: Unit) -> f64 {
    let metric = to_metric(value, unit);
    from_metric(metric, UnitSystem::Imperial.unit_for(unit.quantity()))
}

/// Convert a metric value into `unit` (the inverse of [`to_metric`]).
pub fn from_metric(value: f64, unit: Unit) -> f64 {
    match unit {
        Unit::Celsius
        | Unit::Hectopascal
        | Unit::Millibar
        | Unit::KilometrePerHour
        | Unit::Millimetre
        | Unit::MillimetrePerHour => value,
        Unit::Fahrenheit => value * FAHRENHEIT_PER_CELSIUS + FAHRENHEIT_OFFSET,
        Unit::Kelvin => value + KELVIN_OFFSET,
        Unit::Kilopascal => value / HPA_PER_KPA,
        Unit::InchOfMercury => value / HPA_PER_INHG,
        Unit::MillimetreOfMercury => value / HPA_PER_MMHG,
        Unit::MilePerHour => value / KMH_PER_MPH,
        Unit::MetrePerSecond => value / KMH_PER_MS,
        Unit::Knot => value / KMH_PER_KNOT,
        Unit::Inch | Unit::InchPerHour => value / MM_PER_INCH,
    }
}

pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from.quantity() != to.quantity() {
        return Err(UnitError::IncompatibleUnits { from, to });
    }
    Ok(from_metric(to_metric(value, from), to))
}

/// Parse a unit symbol and convert `value` to metric.
pub fn to_metric_from_symbol(value: f64, symbol: &str) -> Result<f64, UnitError> {
    Ok(to_metric(value, symbol.parse()?))
}

/// Round half-to-even at `decimals` places.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}

/// Metric `value` as displayed in `system`: converted, then rounded.
pub fn present(value: f64, quantity: Quantity, system: UnitSystem) -> f64 {
    let unit = system.unit_for(quantity);
    round_half_even(from_metric(value, unit), system.presentation_decimals(quantity))
}
