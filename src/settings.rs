use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::analyzers::DerivationThresholds;
use crate::error::{ProcessingError, Result};
use crate::processors::GlitchThresholds;
use crate::utils::constants::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TIMEZONE, MAX_ALTITUDE_M,
    MIN_ALTITUDE_M, MIN_POLL_INTERVAL_SECS,
};
use crate::utils::units::UnitSystem;

pub const ENV_PREFIX: &str = "PWS";

/// Environment variable holding the Weather Underground key, shared by the
/// settings layer and the `watch --api-key` flag.
pub const API_KEY_ENV: &str = "PWS_STATION__API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StationSettings {
    pub station_id: String,
    pub api_key: String,

    /// Metres above sea level; enables station-pressure thermodynamics.
    #[validate(range(min = MIN_ALTITUDE_M, max = MAX_ALTITUDE_M))]
    pub altitude_m: Option<f64>,

    #[validate(range(min = -360.0, max = 360.0))]
    pub wind_direction_offset: f64,
}

/// Runtime configuration, layered from defaults, an optional TOML file and
/// `PWS_*` environment variables (nested keys separated by `__`, e.g.
/// `PWS_STATION__API_KEY`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(range(min = MIN_POLL_INTERVAL_SECS, max = 3600))]
    pub poll_interval_secs: u64,

    #[validate(range(min = 1, max = 300))]
    pub fetch_timeout_secs: u64,

    pub unit_system: UnitSystem,

    /// IANA name; station-local days are computed in this zone.
    pub timezone: String,

    pub archive_path: Option<PathBuf>,

    #[validate(nested)]
    pub station: StationSettings,

    #[validate(nested)]
    pub derivation: DerivationThresholds,

    #[validate(nested)]
    pub glitch: GlitchThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            unit_system: UnitSystem::default(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            archive_path: None,
            station: StationSettings::default(),
            derivation: DerivationThresholds::default(),
            glitch: GlitchThresholds::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()?;
        Ok(settings)
    }

    /// Field ranges plus the cross-field rules derive macros can't express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if !self.derivation.regimes_disjoint() {
            return Err(ProcessingError::Config(format!(
                "heat index minimum temperature ({} °C) must be above wind chill maximum temperature ({} °C)",
                self.derivation.heat_index_min_temp, self.derivation.wind_chill_max_temp
            )));
        }
        if self.fetch_timeout_secs > self.poll_interval_secs {
            return Err(ProcessingError::Config(format!(
                "fetch timeout ({}s) exceeds poll interval ({}s)",
                self.fetch_timeout_secs, self.poll_interval_secs
            )));
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ProcessingError::InvalidTimezone(self.timezone.clone()))
    }

    /// Glitch thresholds with the window defaulting to the poll interval.
    pub fn glitch_thresholds(&self) -> GlitchThresholds {
        self.glitch.clone().with_default_window(self.poll_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
