use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProcessingError, Result};

/// A measured field of a station reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
    WindGust,
    PrecipRate,
    PrecipTotal,
    SolarRadiation,
    UvIndex,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Temperature,
        Field::Humidity,
        Field::Pressure,
        Field::WindSpeed,
        Field::WindDirection,
        Field::WindGust,
        Field::PrecipRate,
        Field::PrecipTotal,
        Field::SolarRadiation,
        Field::UvIndex,
    ];

    /// Fields a reading must carry to be processed at all.
    pub const REQUIRED: [Field; 6] = [
        Field::Temperature,
        Field::Humidity,
        Field::Pressure,
        Field::WindSpeed,
        Field::PrecipRate,
        Field::PrecipTotal,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::WindSpeed => "wind_speed",
            Field::WindDirection => "wind_direction",
            Field::WindGust => "wind_gust",
            Field::PrecipRate => "precip_rate",
            Field::PrecipTotal => "precip_total",
            Field::SolarRadiation => "solar_radiation",
            Field::UvIndex => "uv_index",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One observation as delivered by the data source, in metric units:
/// °C, %, hPa (sea level), km/h, degrees, mm/h, mm, W/m².
///
/// Every measured value is optional here; the validator decides which
/// absences are acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default)]
    pub wind_gust: Option<f64>,
    #[serde(default)]
    pub precip_rate: Option<f64>,
    #[serde(default)]
    pub precip_total: Option<f64>,
    #[serde(default)]
    pub solar_radiation: Option<f64>,
    #[serde(default)]
    pub uv_index: Option<f64>,
}

impl RawReading {
    pub fn builder() -> RawReadingBuilder {
        RawReadingBuilder::new()
    }

    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::WindSpeed => self.wind_speed,
            Field::WindDirection => self.wind_direction,
            Field::WindGust => self.wind_gust,
            Field::PrecipRate => self.precip_rate,
            Field::PrecipTotal => self.precip_total,
            Field::SolarRadiation => self.solar_radiation,
            Field::UvIndex => self.uv_index,
        }
    }

    /// Calendar date of the reading at the station.
    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        self.timestamp.with_timezone(tz).date_naive()
    }

    pub fn missing_required(&self) -> Vec<Field> {
        Field::REQUIRED
            .into_iter()
            .filter(|field| self.value(*field).is_none())
            .collect()
    }

    pub fn has_solar_data(&self) -> bool {
        self.solar_radiation.is_some() || self.uv_index.is_some()
    }
}

#[derive(Debug, Default)]
pub struct RawReadingBuilder {
    timestamp: Option<DateTime<Utc>>,
    temperature: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    wind_gust: Option<f64>,
    precip_rate: Option<f64>,
    precip_total: Option<f64>,
    solar_radiation: Option<f64>,
    uv_index: Option<f64>,
}

impl RawReadingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn temperature(mut self, celsius: f64) -> Self {
        self.temperature = Some(celsius);
        self
    }

    pub fn humidity(mut self, percent: f64) -> Self {
        self.humidity = Some(percent);
        self
    }

    pub fn pressure(mut self, hpa: f64) -> Self {
        self.pressure = Some(hpa);
        self
    }

    pub fn wind(mut self, speed_kmh: f64, direction_deg: f64) -> Self {
        self.wind_speed = Some(speed_kmh);
        self.wind_direction = Some(direction_deg);
        self
    }

    pub fn wind_speed(mut self, speed_kmh: f64) -> Self {
        self.wind_speed = Some(speed_kmh);
        self
    }

    pub fn wind_gust(mut self, gust_kmh: f64) -> Self {
        self.wind_gust = Some(gust_kmh);
        self
    }

    pub fn precipitation(mut self, rate_mm_h: f64, total_mm: f64) -> Self {
        self.precip_rate = Some(rate_mm_h);
        self.precip_total = Some(total_mm);
        self
    }

    pub fn solar_radiation(mut self, w_m2: f64) -> Self {
        self.solar_radiation = Some(w_m2);
        self
    }

    pub fn uv_index(mut self, uv: f64) -> Self {
        self.uv_index = Some(uv);
        self
    }

    pub fn build(self) -> Result<RawReading> {
        Ok(RawReading {
            timestamp: self
                .timestamp
                .ok_or_else(|| ProcessingError::MissingData("timestamp".to_string()))?,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            wind_gust: self.wind_gust,
            precip_rate: self.precip_rate,
            precip_total: self.precip_total,
            solar_radiation: self.solar_radiation,
            uv_index: self.uv_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_builder_pattern() {
        let reading = RawReading::builder()
            .timestamp(timestamp())
            .temperature(21.5)
            .humidity(55.0)
            .pressure(1015.2)
            .wind(12.0, 270.0)
            .precipitation(0.0, 1.2)
            .build()
            .unwrap();

        assert_eq!(reading.temperature, Some(21.5));
        assert_eq!(reading.value(Field::WindDirection), Some(270.0));
        assert!(reading.missing_required().is_empty());
        assert!(!reading.has_solar_data());
    }

    #[test]
    fn test_builder_requires_timestamp() {
        let result = RawReading::builder().temperature(10.0).build();
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
    }

    #[test]
    fn test_missing_required_fields() {
        let reading = RawReading::builder()
            .timestamp(timestamp())
            .temperature(21.5)
            .build()
            .unwrap();

        let missing = reading.missing_required();
        assert_eq!(missing.len(), 5);
        assert!(missing.contains(&Field::Humidity));
        assert!(!missing.contains(&Field::Temperature));
    }

    #[test]
    fn test_local_date_uses_station_zone() {
        // 2024-07-15 23:30 UTC is already the 16th in Madrid (UTC+2)
        let reading = RawReading::builder()
            .timestamp(Utc.with_ymd_and_hms(2024, 7, 15, 23, 30, 0).unwrap())
            .build()
            .unwrap();

        assert_eq!(
            reading.local_date(&chrono_tz::Europe::Madrid),
            NaiveDate::from_ymd_opt(2024, 7, 16).unwrap()
        );
        assert_eq!(
            reading.local_date(&chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
        );
    }
}
