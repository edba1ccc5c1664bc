//! Solar radiation, evapotranspiration and the day's water balance.
//!
//! Without latitude or day of year the station has no clear-sky model, so
//! sky clarity is measured against a fixed theoretical maximum.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::constants::{
    ET0_HUMID_REDUCTION, ET0_HUMID_THRESHOLD, MJ_PER_WM2_DAY, PT_ALBEDO, PT_ALPHA,
    PT_INSTANT_TO_DAILY, PT_LATENT_HEAT_MJ_KG, PT_PSYCHROMETRIC_COEF, SOLAR_MAX_THEORETICAL,
};

/// Reference evapotranspiration (mm/day), simplified Priestley-Taylor.
///
/// The instantaneous reading is scaled by one half to approximate a daily
/// mean, and very humid air (> 80 %) trims the result by up to 10 %.
pub fn priestley_taylor_et0(
    solar_w_m2: f64,
    temp_c: f64,
    humidity: f64,
    pressure_hpa: f64,
) -> Option<f64> {
    if !(solar_w_m2 >= 0.0 && temp_c.is_finite() && pressure_hpa > 0.0)
        || !(0.0..=100.0).contains(&humidity)
    {
        return None;
    }

    let gamma = PT_PSYCHROMETRIC_COEF * pressure_hpa / 10.0; // kPa/°C
    let es = 0.6108 * ((17.27 * temp_c) / (temp_c + 237.3)).exp();
    let delta = 4098.0 * es / (temp_c + 237.3).powi(2);
    if delta + gamma <= 0.0 {
        return None;
    }

    let net_radiation = solar_w_m2 * MJ_PER_WM2_DAY * PT_INSTANT_TO_DAILY * (1.0 - PT_ALBEDO);
    let mut et0 = PT_ALPHA * (delta / (delta + gamma)) * (net_radiation / PT_LATENT_HEAT_MJ_KG);

    if humidity > ET0_HUMID_THRESHOLD {
        let excess = (humidity - ET0_HUMID_THRESHOLD) / (100.0 - ET0_HUMID_THRESHOLD);
        et0 *= 1.0 - ET0_HUMID_REDUCTION * excess;
    }
    Some(et0.max(0.0))
}

/// Fraction (0-1) of the theoretical maximum irradiance reaching the sensor.
pub fn sky_clarity_index(solar_w_m2: f64) -> Option<f64> {
    if !(solar_w_m2 >= 0.0) {
        return None;
    }
    Some((solar_w_m2 / SOLAR_MAX_THEORETICAL).clamp(0.0, 1.0))
}

/// Rain so far today minus the evapotranspiration estimate, mm.
pub fn water_balance(precip_mm: f64, et0_mm: f64) -> f64 {
    precip_mm - et0_mm
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkyCondition {
    Overcast,
    Cloudy,
    PartlyCloudy,
    MostlyClear,
    Clear,
}

impl SkyCondition {
    pub fn classify(clarity: f64) -> Self {
        if clarity >= 0.8 {
            SkyCondition::Clear
        } else if clarity >= 0.6 {
            SkyCondition::MostlyClear
        } else if clarity >= 0.4 {
            SkyCondition::PartlyCloudy
        } else if clarity >= 0.2 {
            SkyCondition::Cloudy
        } else {
            SkyCondition::Overcast
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkyCondition::Clear => "Clear",
            SkyCondition::MostlyClear => "Mostly clear",
            SkyCondition::PartlyCloudy => "Partly cloudy",
            SkyCondition::Cloudy => "Cloudy",
            SkyCondition::Overcast => "Overcast",
        }
    }
}

impl fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// WHO UV index exposure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UvRisk {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvRisk {
    pub fn classify(uv: f64) -> Option<Self> {
        if !uv.is_finite() {
            return None;
        }
        let risk = if uv < 3.0 {
            UvRisk::Low
        } else if uv < 6.0 {
            UvRisk::Moderate
        } else if uv < 8.0 {
            UvRisk::High
        } else if uv < 11.0 {
            UvRisk::VeryHigh
        } else {
            UvRisk::Extreme
        };
        Some(risk)
    }

    pub fn label(&self) -> &'static str {
        match self {
            UvRisk::Low => "Low",
            UvRisk::Moderate => "Moderate",
            UvRisk::High => "High",
            UvRisk::VeryHigh => "Very high",
            UvRisk::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for UvRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterBalanceClass {
    Excess,
    Surplus,
    Balanced,
    MildDeficit,
    Deficit,
}

impl WaterBalanceClass {
    pub fn classify(balance_mm: f64) -> Self {
        if balance_mm > 5.0 {
            WaterBalanceClass::Excess
        } else if balance_mm > 0.0 {
            WaterBalanceClass::Surplus
        } else if balance_mm > -2.0 {
            WaterBalanceClass::Balanced
        } else if balance_mm > -5.0 {
            WaterBalanceClass::MildDeficit
        } else {
            WaterBalanceClass::Deficit
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WaterBalanceClass::Excess => "Excess",
            WaterBalanceClass::Surplus => "Surplus",
            WaterBalanceClass::Balanced => "Balanced",
            WaterBalanceClass::MildDeficit => "Mild deficit",
            WaterBalanceClass::Deficit => "Deficit",
        }
    }
}

impl fmt::Display for WaterBalanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
