//! Moist-air thermodynamics from temperature (°C), relative humidity (%)
//! and pressure (hPa).
//!
//! Functions whose formula has a restricted domain return `None` outside it.

use crate::utils::constants::{
    CP, DEW_POINT_MAX_TEMP, DEW_POINT_MIN_TEMP, EPSILON, G0, KAPPA, KELVIN_OFFSET,
    LCL_METRES_PER_DEGREE, LV, MAGNUS_A, MAGNUS_B, MAGNUS_E0_HPA, RD, REFERENCE_PRESSURE_HPA, RV,
    TV_COEF, WET_BULB_MAX_HUMIDITY, WET_BULB_MAX_TEMP, WET_BULB_MIN_HUMIDITY, WET_BULB_MIN_TEMP,
};

/// Saturation vapour pressure over water (Magnus-Tetens), hPa.
pub fn saturation_vapor_pressure(temp_c: f64) -> f64 {
    MAGNUS_E0_HPA * ((MAGNUS_A * temp_c) / (temp_c + MAGNUS_B)).exp()
}

pub fn vapor_pressure(temp_c: f64, humidity: f64) -> f64 {
    (humidity / 100.0) * saturation_vapor_pressure(temp_c)
}

/// Dew point by inverting Magnus-Tetens.
pub fn dew_point(temp_c: f64, humidity: f64) -> Option<f64> {
    if !(humidity > 0.0 && humidity <= 100.0) {
        return None;
    }
    if !(DEW_POINT_MIN_TEMP..=DEW_POINT_MAX_TEMP).contains(&temp_c) {
        return None;
    }

    let gamma = (humidity / 100.0).ln() + (MAGNUS_A * temp_c) / (MAGNUS_B + temp_c);
    Some(MAGNUS_B * gamma / (MAGNUS_A - gamma))
}

/// Relative humidity (%) implied by a temperature and dew point pair.
pub fn relative_humidity(temp_c: f64, dew_point_c: f64) -> f64 {
    100.0 * saturation_vapor_pressure(dew_point_c) / saturation_vapor_pressure(temp_c)
}

/// Rothfusz regression (NWS), evaluated in °F. No domain check here; see
/// `DerivedCalculator` for the thresholds that gate it.
pub fn rothfusz_heat_index(temp_c: f64, humidity: f64) -> f64 {
    let t = temp_c * 9.0 / 5.0 + 32.0;
    let rh = humidity;

    let hi_f = -42.379 + 2.049_015_23 * t + 10.143_331_27 * rh
        - 0.224_755_41 * t * rh
        - 0.006_837_83 * t * t
        - 0.054_817_17 * rh * rh
        + 0.001_228_74 * t * t * rh
        + 0.000_852_82 * t * rh * rh
        - 0.000_001_99 * t * t * rh * rh;

    (hi_f - 32.0) * 5.0 / 9.0
}

/// JAG/TI wind chill (Environment Canada / NWS 2001), wind in km/h.
pub fn jagti_wind_chill(temp_c: f64, wind_kmh: f64) -> f64 {
    let v = wind_kmh.powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v + 0.3965 * temp_c * v
}

/// Wet-bulb temperature after Stull (2011). The empirical fit is only
/// published for 5-99 % humidity and -20..50 °C.
pub fn wet_bulb_stull(temp_c: f64, humidity: f64) -> Option<f64> {
    if !(WET_BULB_MIN_HUMIDITY..=WET_BULB_MAX_HUMIDITY).contains(&humidity)
        || !(WET_BULB_MIN_TEMP..=WET_BULB_MAX_TEMP).contains(&temp_c)
    {
        return None;
    }

    let t = temp_c;
    let rh = humidity;
    Some(
        t * (0.151_977 * (rh + 8.313_659).sqrt()).atan() + (t + rh).atan()
            - (rh - 1.676_331).atan()
            + 0.003_918_38 * rh.powf(1.5) * (0.023_101 * rh).atan()
            - 4.686_035,
    )
}

/// Mixing ratio (g/kg) from vapour pressure and total pressure, both hPa.
pub fn mixing_ratio(vapor_hpa: f64, pressure_hpa: f64) -> Option<f64> {
    if pressure_hpa <= vapor_hpa {
        return None;
    }
    Some(1000.0 * EPSILON * vapor_hpa / (pressure_hpa - vapor_hpa))
}

/// Specific humidity (g/kg).
pub fn specific_humidity(vapor_hpa: f64, pressure_hpa: f64) -> Option<f64> {
    let r = mixing_ratio(vapor_hpa, pressure_hpa)? / 1000.0;
    Some(1000.0 * r / (1.0 + r))
}

/// Absolute humidity (g/m³).
pub fn absolute_humidity(vapor_hpa: f64, temp_c: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    (vapor_hpa * 100.0) / (RV * t_k) * 1000.0
}

/// Potential temperature referred to 1000 hPa, °C.
pub fn potential_temperature(temp_c: f64, pressure_hpa: f64) -> Option<f64> {
    if pressure_hpa <= 0.0 {
        return None;
    }
    let t_k = temp_c + KELVIN_OFFSET;
    Some(t_k * (REFERENCE_PRESSURE_HPA / pressure_hpa).powf(KAPPA) - KELVIN_OFFSET)
}

/// Virtual temperature, °C, from specific humidity in g/kg.
pub fn virtual_temperature(temp_c: f64, specific_humidity_gkg: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    t_k * (1.0 + TV_COEF * specific_humidity_gkg / 1000.0) - KELVIN_OFFSET
}

/// Equivalent temperature, °C.
pub fn equivalent_temperature(temp_c: f64, specific_humidity_gkg: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    let q = specific_humidity_gkg / 1000.0;
    t_k * ((LV * q) / (CP * t_k)).exp() - KELVIN_OFFSET
}

/// Equivalent potential temperature θe, °C: the potential temperature of
/// the parcel after condensing out all of its vapour.
pub fn equivalent_potential_temperature(
    temp_c: f64,
    pressure_hpa: f64,
    specific_humidity_gkg: f64,
) -> Option<f64> {
    let theta_k = potential_temperature(temp_c, pressure_hpa)? + KELVIN_OFFSET;
    let t_k = temp_c + KELVIN_OFFSET;
    let q = specific_humidity_gkg / 1000.0;
    Some(theta_k * ((LV * q) / (CP * t_k)).exp() - KELVIN_OFFSET)
}

/// Moist air density (kg/m³) from pressure and virtual temperature.
pub fn air_density(pressure_hpa: f64, virtual_temp_c: f64) -> f64 {
    (pressure_hpa * 100.0) / (RD * (virtual_temp_c + KELVIN_OFFSET))
}

/// Height of the lifting condensation level above the station, metres.
pub fn lcl_height(temp_c: f64, dew_point_c: f64) -> f64 {
    (LCL_METRES_PER_DEGREE * (temp_c - dew_point_c)).max(0.0)
}

/// Hypsometric reduction of sea-level pressure to station height.
pub fn station_pressure(sea_level_hpa: f64, altitude_m: f64, temp_c: f64) -> f64 {
    let t_k = temp_c + KELVIN_OFFSET;
    sea_level_hpa * (-G0 * altitude_m / (RD * t_k)).exp()
}
