use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analyzers::{PressureTrend, RainIntensity, RainRates};
use crate::models::{DerivedVariables, ExtremaRecord, RawReading, Warning};
use crate::utils::units::{present, round_half_even, Quantity, UnitSystem};

/// Current conditions as shown to the operator: converted to the preferred
/// unit system and rounded half-to-even at display precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayValues {
    pub unit_system: UnitSystem,
    pub temperature: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub heat_index: Option<f64>,
    pub wind_chill: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_direction: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_total: Option<f64>,
}

impl DisplayValues {
    pub fn new(reading: &RawReading, derived: &DerivedVariables, system: UnitSystem) -> Self {
        let show = |value: Option<f64>, quantity| value.map(|v| present(v, quantity, system));

        Self {
            unit_system: system,
            temperature: show(reading.temperature, Quantity::Temperature),
            apparent_temperature: show(derived.apparent_temperature, Quantity::Temperature),
            dew_point: show(derived.dew_point, Quantity::Temperature),
            heat_index: show(derived.heat_index, Quantity::Temperature),
            wind_chill: show(derived.wind_chill, Quantity::Temperature),
            humidity: reading.humidity.map(|h| round_half_even(h, 0)),
            pressure: show(reading.pressure, Quantity::Pressure),
            wind_speed: show(reading.wind_speed, Quantity::Speed),
            wind_gust: show(reading.wind_gust, Quantity::Speed),
            wind_direction: reading.wind_direction.map(|d| round_half_even(d, 0)),
            precip_rate: show(reading.precip_rate, Quantity::PrecipitationRate),
            precip_total: show(reading.precip_total, Quantity::Precipitation),
        }
    }
}

/// Output of one successful pipeline cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSnapshot {
    pub reading: RawReading,
    /// Station-local calendar day the reading was attributed to.
    pub local_date: NaiveDate,
    pub derived: DerivedVariables,
    pub extrema: Arc<ExtremaRecord>,
    pub warnings: Vec<Warning>,
    pub pressure_trend: Option<PressureTrend>,
    pub rain_intensity: Option<RainIntensity>,
    /// Rates recovered from the daily accumulation counter, mm/h.
    pub rain_rates: RainRates,
    pub display: DisplayValues,
}

impl ProcessedSnapshot {
    pub fn is_flagged(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        let system = self.display.unit_system;
        let t_unit = system.unit_for(Quantity::Temperature);
        let p_unit = system.unit_for(Quantity::Pressure);
        let v_unit = system.unit_for(Quantity::Speed);
        let fmt = |value: Option<f64>| {
            value
                .map(|v| format!("{}", v))
                .unwrap_or_else(|| "--".to_string())
        };

        let trend = self
            .pressure_trend
            .map(|t| format!(" {} {} ({})", t.tendency.arrow(), t.tendency, t.outlook))
            .unwrap_or_default();
        let mut rain = self
            .rain_intensity
            .map(|r| r.label().to_string())
            .unwrap_or_else(|| "--".to_string());
        if self.rain_intensity.is_some_and(|r| r.is_raining()) {
            if let Some(rate) = self.rain_rates.five_minutes {
                rain.push_str(&format!(" {:.1} mm/h over 5 min", rate));
            }
        }

        let mut summary = format!(
            "[{}] T {}{} (feels {}{}) | Td {}{} | RH {}% | P {}{}{} | Wind {}{} gust {}{} | {}",
            self.reading.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            fmt(self.display.temperature),
            t_unit,
            fmt(self.display.apparent_temperature),
            t_unit,
            fmt(self.display.dew_point),
            t_unit,
            fmt(self.display.humidity),
            fmt(self.display.pressure),
            p_unit,
            trend,
            fmt(self.display.wind_speed),
            v_unit,
            fmt(self.display.wind_gust),
            v_unit,
            rain,
        );

        for warning in &self.warnings {
            summary.push_str(&format!("\n  ⚠️  {}", warning));
        }
        summary
    }
}
