use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::analyzers::radiation::{
    priestley_taylor_et0, sky_clarity_index, water_balance, SkyCondition, UvRisk,
    WaterBalanceClass,
};
use crate::analyzers::thermodynamics::{
    absolute_humidity, air_density, dew_point, equivalent_potential_temperature,
    equivalent_temperature, jagti_wind_chill, lcl_height, mixing_ratio, potential_temperature,
    relative_humidity, rothfusz_heat_index, saturation_vapor_pressure, specific_humidity,
    station_pressure, vapor_pressure, virtual_temperature, wet_bulb_stull,
};
use crate::models::{DerivedVariables, Radiation, RawReading, Thermodynamics};
use crate::utils::constants::{
    HEAT_INDEX_MIN_HUMIDITY, HEAT_INDEX_MIN_TEMP, HUMIDITY_CONSISTENCY_TOLERANCE,
    WIND_CHILL_MAX_TEMP, WIND_CHILL_MIN_SPEED,
};

/// Domains in which heat index and wind chill are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DerivationThresholds {
    /// °C; heat index needs temperature at or above this
    #[validate(range(min = 20.0, max = 45.0))]
    pub heat_index_min_temp: f64,

    /// %; heat index needs humidity at or above this
    #[validate(range(min = 0.0, max = 100.0))]
    pub heat_index_min_humidity: f64,

    /// °C; wind chill needs temperature at or below this
    #[validate(range(min = -20.0, max = 15.0))]
    pub wind_chill_max_temp: f64,

    /// km/h; wind chill needs wind at or above this
    #[validate(range(min = 0.0, max = 50.0))]
    pub wind_chill_min_speed: f64,
}

impl Default for DerivationThresholds {
    fn default() -> Self {
        Self {
            heat_index_min_temp: HEAT_INDEX_MIN_TEMP,
            heat_index_min_humidity: HEAT_INDEX_MIN_HUMIDITY,
            wind_chill_max_temp: WIND_CHILL_MAX_TEMP,
            wind_chill_min_speed: WIND_CHILL_MIN_SPEED,
        }
    }
}

impl DerivationThresholds {
    /// Heat index and wind chill can never both apply.
    pub fn regimes_disjoint(&self) -> bool {
        self.heat_index_min_temp > self.wind_chill_max_temp
    }

    pub fn heat_index_applies(&self, temp_c: f64, humidity: f64) -> bool {
        temp_c >= self.heat_index_min_temp && humidity >= self.heat_index_min_humidity
    }

    pub fn wind_chill_applies(&self, temp_c: f64, wind_kmh: f64) -> bool {
        temp_c <= self.wind_chill_max_temp && wind_kmh >= self.wind_chill_min_speed
    }
}

/// Computes derived variables from a reading. Stateless: the same reading
/// always yields the same result.
#[derive(Debug, Clone, Default)]
pub struct DerivedCalculator {
    thresholds: DerivationThresholds,
    altitude_m: Option<f64>,
}

impl DerivedCalculator {
    pub fn new(thresholds: DerivationThresholds) -> Self {
        Self {
            thresholds,
            altitude_m: None,
        }
    }

    pub fn with_altitude(mut self, altitude_m: Option<f64>) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    pub fn thresholds(&self) -> &DerivationThresholds {
        &self.thresholds
    }

    pub fn heat_index(&self, temp_c: f64, humidity: f64) -> Option<f64> {
        self.thresholds
            .heat_index_applies(temp_c, humidity)
            .then(|| rothfusz_heat_index(temp_c, humidity))
    }

    pub fn wind_chill(&self, temp_c: f64, wind_kmh: f64) -> Option<f64> {
        self.thresholds
            .wind_chill_applies(temp_c, wind_kmh)
            .then(|| jagti_wind_chill(temp_c, wind_kmh))
    }

    pub fn derive(&self, reading: &RawReading) -> DerivedVariables {
        let Some(temp) = reading.temperature else {
            return DerivedVariables::default();
        };

        let dew_point = reading
            .humidity
            .and_then(|rh| dew_point(temp, rh).filter(|td| humidity_consistent(temp, rh, *td)));
        let heat_index = reading.humidity.and_then(|rh| self.heat_index(temp, rh));
        let wind_chill = reading.wind_speed.and_then(|v| self.wind_chill(temp, v));
        let apparent_temperature = Some(apparent_temperature(temp, heat_index, wind_chill));

        debug!(
            temperature = temp,
            ?dew_point,
            ?heat_index,
            ?wind_chill,
            "derived variables"
        );

        let thermodynamics = self.thermodynamics(reading, temp, dew_point);
        let radiation = if reading.has_solar_data() {
            let pressure = thermodynamics.station_pressure.or(reading.pressure);
            Self::radiation(reading, temp, pressure)
        } else {
            Radiation::default()
        };

        DerivedVariables {
            dew_point,
            heat_index,
            wind_chill,
            apparent_temperature,
            thermodynamics,
            radiation,
        }
    }

    fn radiation(reading: &RawReading, temp: f64, pressure: Option<f64>) -> Radiation {
        let et0 = match (reading.solar_radiation, reading.humidity, pressure) {
            (Some(solar), Some(rh), Some(p)) => priestley_taylor_et0(solar, temp, rh, p),
            _ => None,
        };
        let sky_clarity = reading.solar_radiation.and_then(sky_clarity_index);
        let balance = match (reading.precip_total, et0) {
            (Some(rain), Some(et0)) => Some(water_balance(rain, et0)),
            _ => None,
        };

        Radiation {
            et0,
            sky_clarity,
            sky: sky_clarity.map(SkyCondition::classify),
            uv_risk: reading.uv_index.and_then(UvRisk::classify),
            water_balance: balance,
            water_balance_class: balance.map(WaterBalanceClass::classify),
        }
    }

    fn thermodynamics(
        &self,
        reading: &RawReading,
        temp: f64,
        dew_point: Option<f64>,
    ) -> Thermodynamics {
        let station_pressure = match (reading.pressure, self.altitude_m) {
            (Some(p), Some(z)) => Some(station_pressure(p, z, temp)),
            _ => None,
        };
        let pressure = station_pressure.or(reading.pressure);

        let Some(rh) = reading.humidity else {
            return Thermodynamics {
                station_pressure,
                potential_temperature: pressure.and_then(|p| potential_temperature(temp, p)),
                ..Default::default()
            };
        };

        let e = vapor_pressure(temp, rh);
        let specific = pressure.and_then(|p| specific_humidity(e, p));
        let virtual_temp = specific.map(|q| virtual_temperature(temp, q));

        Thermodynamics {
            station_pressure,
            saturation_vapor_pressure: Some(saturation_vapor_pressure(temp)),
            vapor_pressure: Some(e),
            wet_bulb: wet_bulb_stull(temp, rh),
            mixing_ratio: pressure.and_then(|p| mixing_ratio(e, p)),
            specific_humidity: specific,
            absolute_humidity: Some(absolute_humidity(e, temp)),
            potential_temperature: pressure.and_then(|p| potential_temperature(temp, p)),
            virtual_temperature: virtual_temp,
            equivalent_temperature: specific.map(|q| equivalent_temperature(temp, q)),
            equivalent_potential_temperature: match (pressure, specific) {
                (Some(p), Some(q)) => equivalent_potential_temperature(temp, p, q),
                _ => None,
            },
            air_density: match (pressure, virtual_temp) {
                (Some(p), Some(tv)) => Some(air_density(p, tv)),
                _ => None,
            },
            lcl_height: dew_point.map(|td| lcl_height(temp, td)),
        }
    }
}

/// A dew point is only reported when it lies at or below the air
/// temperature and reproduces the measured humidity.
pub fn humidity_consistent(temp_c: f64, humidity: f64, dew_point_c: f64) -> bool {
    dew_point_c <= temp_c + 1e-9
        && (relative_humidity(temp_c, dew_point_c) - humidity).abs() <= HUMIDITY_CONSISTENCY_TOLERANCE
}

/// "Feels like": wind chill when it applies, else heat index, else the
/// air temperature itself.
pub fn apparent_temperature(temp_c: f64, heat_index: Option<f64>, wind_chill: Option<f64>) -> f64 {
    wind_chill.or(heat_index).unwrap_or(temp_c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading(temp: f64, humidity: f64, wind: f64) -> RawReading {
        RawReading::builder()
            .timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
            .temperature(temp)
            .humidity(humidity)
            .pressure(1013.0)
            .wind_speed(wind)
            .precipitation(0.0, 0.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_hot_and_humid() {
        let derived = DerivedCalculator::default().derive(&reading(30.0, 70.0, 5.0));

        let hi = derived.heat_index.unwrap();
        assert!((hi - 35.0).abs() < 0.5);
        assert!(derived.wind_chill.is_none());
        assert_eq!(derived.apparent_temperature, Some(hi));
        assert!(derived.feels_different());
    }

    #[test]
    fn test_cold_and_windy() {
        let derived = DerivedCalculator::default().derive(&reading(-5.0, 60.0, 20.0));

        let wc = derived.wind_chill.unwrap();
        assert!(wc < -5.0);
        assert!(derived.heat_index.is_none());
        assert_eq!(derived.apparent_temperature, Some(wc));
    }

    #[test]
    fn test_mild_conditions_feel_like_air_temperature() {
        let derived = DerivedCalculator::default().derive(&reading(15.0, 60.0, 5.0));

        assert!(derived.heat_index.is_none());
        assert!(derived.wind_chill.is_none());
        assert_eq!(derived.apparent_temperature, Some(15.0));
        assert!(!derived.feels_different());
    }

    #[test]
    fn test_heat_index_needs_humidity() {
        let calculator = DerivedCalculator::default();
        assert!(calculator.heat_index(32.0, 39.9).is_none());
        assert!(calculator.heat_index(26.9, 80.0).is_none());
        assert!(calculator.heat_index(27.0, 40.0).is_some());
    }

    #[test]
    fn test_wind_chill_needs_wind() {
        let calculator = DerivedCalculator::default();
        assert!(calculator.wind_chill(0.0, 4.7).is_none());
        assert!(calculator.wind_chill(10.1, 30.0).is_none());
        assert!(calculator.wind_chill(10.0, 4.8).is_some());
    }

    #[test]
    fn test_missing_temperature_derives_nothing() {
        let mut raw = reading(15.0, 60.0, 5.0);
        raw.temperature = None;
        assert_eq!(
            DerivedCalculator::default().derive(&raw),
            DerivedVariables::default()
        );
    }

    #[test]
    fn test_station_pressure_only_with_altitude() {
        let raw = reading(15.0, 60.0, 5.0);

        let sea_level = DerivedCalculator::default().derive(&raw);
        assert!(sea_level.thermodynamics.station_pressure.is_none());
        assert!(sea_level.thermodynamics.mixing_ratio.is_some());

        let at_altitude = DerivedCalculator::default()
            .with_altitude(Some(650.0))
            .derive(&raw);
        let p = at_altitude.thermodynamics.station_pressure.unwrap();
        assert!(p < 1013.0);
        assert!(
            at_altitude.thermodynamics.mixing_ratio.unwrap()
                > sea_level.thermodynamics.mixing_ratio.unwrap()
        );
    }

    #[test]
    fn test_humidity_consistency() {
        assert!(humidity_consistent(20.0, 60.0, dew_point(20.0, 60.0).unwrap()));
        assert!(!humidity_consistent(20.0, 60.0, 21.0));
        assert!(!humidity_consistent(20.0, 60.0, 5.0));
    }

    #[test]
    fn test_equivalent_temperature_needs_pressure() {
        let mut raw = reading(25.0, 60.0, 5.0);
        assert!(
            DerivedCalculator::default()
                .derive(&raw)
                .thermodynamics
                .equivalent_temperature
                .unwrap()
                > 25.0
        );

        raw.pressure = None;
        let derived = DerivedCalculator::default().derive(&raw);
        assert!(derived.thermodynamics.equivalent_temperature.is_none());
        assert!(derived.dew_point.is_some());
    }

    #[test]
    fn test_radiation_needs_solar_sensor() {
        let raw = reading(25.0, 50.0, 5.0);
        assert_eq!(
            DerivedCalculator::default().derive(&raw).radiation,
            Radiation::default()
        );

        let raw = RawReading {
            solar_radiation: Some(850.0),
            uv_index: Some(7.0),
            precip_total: Some(1.2),
            ..raw
        };
        let radiation = DerivedCalculator::default().derive(&raw).radiation;
        let et0 = radiation.et0.unwrap();
        assert!(et0 > 0.0);
        assert_eq!(radiation.sky, Some(SkyCondition::Clear));
        assert_eq!(radiation.uv_risk, Some(UvRisk::High));
        assert!((radiation.water_balance.unwrap() - (1.2 - et0)).abs() < 1e-9);
        assert_eq!(
            radiation.water_balance_class,
            Some(WaterBalanceClass::Deficit)
        );
    }

    #[test]
    fn test_uv_without_pyranometer() {
        let raw = RawReading {
            uv_index: Some(2.0),
            ..reading(18.0, 50.0, 5.0)
        };
        let radiation = DerivedCalculator::default().derive(&raw).radiation;
        assert_eq!(radiation.uv_risk, Some(UvRisk::Low));
        assert!(radiation.et0.is_none());
        assert!(radiation.water_balance.is_none());
    }

    #[test]
    fn test_default_thresholds_are_disjoint() {
        assert!(DerivationThresholds::default().regimes_disjoint());
        let overlapping = DerivationThresholds {
            heat_index_min_temp: 10.0,
            ..Default::default()
        };
        assert!(!overlapping.regimes_disjoint());
    }
}
