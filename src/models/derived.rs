use serde::{Deserialize, Serialize};

use crate::analyzers::{SkyCondition, UvRisk, WaterBalanceClass};

/// Quantities computed from a reading. `None` means the quantity's formula
/// does not apply to the reading's conditions; it is never an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedVariables {
    pub dew_point: Option<f64>,
    pub heat_index: Option<f64>,
    pub wind_chill: Option<f64>,
    /// Wind chill, else heat index, else the air temperature.
    pub apparent_temperature: Option<f64>,
    pub thermodynamics: Thermodynamics,
    pub radiation: Radiation,
}

impl DerivedVariables {
    pub fn feels_different(&self) -> bool {
        self.heat_index.is_some() || self.wind_chill.is_some()
    }
}

/// Secondary moist-air quantities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Thermodynamics {
    /// Absolute pressure at station height (hPa); needs a configured altitude.
    pub station_pressure: Option<f64>,
    pub saturation_vapor_pressure: Option<f64>,
    pub vapor_pressure: Option<f64>,
    pub wet_bulb: Option<f64>,
    /// g/kg
    pub mixing_ratio: Option<f64>,
    /// g/kg
    pub specific_humidity: Option<f64>,
    /// g/m³
    pub absolute_humidity: Option<f64>,
    pub potential_temperature: Option<f64>,
    pub virtual_temperature: Option<f64>,
    pub equivalent_temperature: Option<f64>,
    pub equivalent_potential_temperature: Option<f64>,
    /// kg/m³
    pub air_density: Option<f64>,
    /// metres above the station
    pub lcl_height: Option<f64>,
}

/// Solar and water-budget quantities; all `None` without a solar sensor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Radiation {
    /// Reference evapotranspiration, mm/day
    pub et0: Option<f64>,
    /// 0-1
    pub sky_clarity: Option<f64>,
    pub sky: Option<SkyCondition>,
    pub uv_risk: Option<UvRisk>,
    /// Rain so far today minus ET0, mm
    pub water_balance: Option<f64>,
    pub water_balance_class: Option<WaterBalanceClass>,
}
