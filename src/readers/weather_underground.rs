use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::analyzers::quantize_accumulation;
use crate::error::{FetchError, ProcessingError, Result};
use crate::models::RawReading;
use crate::readers::ReadingSource;
use crate::utils::constants::WEATHER_UNDERGROUND_URL;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Weather Underground `/v2/pws/observations/current` payload, metric units.
#[derive(Deserialize, Debug)]
struct CurrentConditions {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Observation {
    epoch: Option<i64>,
    obs_time_utc: Option<String>,
    winddir: Option<f64>,
    humidity: Option<f64>,
    solar_radiation: Option<f64>,
    uv: Option<f64>,
    metric: Option<MetricBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct MetricBlock {
    temp: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
    wind_gust: Option<f64>,
    precip_rate: Option<f64>,
    precip_total: Option<f64>,
}

/// Polls a personal weather station through the Weather Underground API.
#[derive(Debug, Clone)]
pub struct WeatherUndergroundSource {
    client: reqwest::Client,
    url: String,
    station_id: String,
    api_key: String,
    wind_direction_offset: f64,
}

impl WeatherUndergroundSource {
    pub fn new(station_id: &str, api_key: &str) -> Result<Self> {
        if station_id.trim().is_empty() {
            return Err(ProcessingError::Config("station id is empty".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(ProcessingError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            url: WEATHER_UNDERGROUND_URL.to_string(),
            station_id: station_id.trim().to_string(),
            api_key: api_key.trim().to_string(),
            wind_direction_offset: 0.0,
        })
    }

    /// Degrees added to the reported wind direction, for vanes that were
    /// not aligned to true north.
    pub fn with_wind_direction_offset(mut self, offset: f64) -> Self {
        self.wind_direction_offset = offset;
        self
    }

    async fn request(&self) -> std::result::Result<RawReading, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("stationId", self.station_id.as_str()),
                ("format", "json"),
                ("units", "m"),
                ("numericPrecision", "decimal"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        check_status(response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        parse_current(&body, self.wind_direction_offset)
    }
}

impl ReadingSource for WeatherUndergroundSource {
    async fn fetch(&mut self) -> std::result::Result<RawReading, FetchError> {
        let result = self.request().await;
        if let Err(e) = &result {
            warn!(station = %self.station_id, error = %e, "weather underground fetch failed");
        }
        result
    }

    fn describe(&self) -> String {
        format!("Weather Underground station {}", self.station_id)
    }
}

fn check_status(status: StatusCode) -> std::result::Result<(), FetchError> {
    match status {
        StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
        StatusCode::NOT_FOUND => Err(FetchError::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited),
        s if s.is_client_error() || s.is_server_error() => Err(FetchError::Status(s.as_u16())),
        // WU answers 204 when the station has not reported recently
        StatusCode::NO_CONTENT => Err(FetchError::Malformed("no current observation".to_string())),
        _ => Ok(()),
    }
}

/// Maps the JSON body of a current-conditions response to a reading.
/// Accumulated rain is snapped to whole gauge tips and the wind direction
/// is rotated by `wind_direction_offset`.
pub fn parse_current(
    body: &str,
    wind_direction_offset: f64,
) -> std::result::Result<RawReading, FetchError> {
    let payload: CurrentConditions =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let observation = payload
        .observations
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::Malformed("no observations in payload".to_string()))?;
    let metric = observation
        .metric
        .ok_or_else(|| FetchError::Malformed("missing metric block".to_string()))?;

    let timestamp = observation_time(observation.epoch, observation.obs_time_utc.as_deref())?;

    let reading = RawReading {
        timestamp,
        temperature: metric.temp,
        humidity: observation.humidity,
        pressure: metric.pressure,
        wind_speed: metric.wind_speed,
        wind_direction: observation
            .winddir
            .map(|d| (d + wind_direction_offset).rem_euclid(360.0)),
        wind_gust: metric.wind_gust,
        precip_rate: metric.precip_rate,
        precip_total: metric.precip_total.map(quantize_accumulation),
        solar_radiation: observation.solar_radiation,
        uv_index: observation.uv,
    };

    debug!(
        timestamp = %reading.timestamp,
        temperature = ?reading.temperature,
        humidity = ?reading.humidity,
        pressure = ?reading.pressure,
        "parsed current observation"
    );
    Ok(reading)
}

fn observation_time(
    epoch: Option<i64>,
    obs_time_utc: Option<&str>,
) -> std::result::Result<DateTime<Utc>, FetchError> {
    if let Some(at) = epoch
        .filter(|e| *e > 0)
        .and_then(|e| DateTime::<Utc>::from_timestamp(e, 0))
    {
        return Ok(at);
    }
    obs_time_utc
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| FetchError::Malformed("observation has no usable timestamp".to_string()))
}
