/// Physical limits; readings outside these are rejected, never clamped
pub const MIN_VALID_TEMP: f64 = -90.0;
pub const MAX_VALID_TEMP: f64 = 60.0;
pub const MIN_HUMIDITY: f64 = 0.0;
pub const MAX_HUMIDITY: f64 = 100.0;
pub const MAX_WIND_DIRECTION: f64 = 360.0;

/// Magnus-Tetens coefficients (Bolton 1980)
pub const MAGNUS_A: f64 = 17.67;
pub const MAGNUS_B: f64 = 243.5;
pub const MAGNUS_E0_HPA: f64 = 6.112;

/// Temperature window (°C) in which the Magnus approximation is trusted
pub const DEW_POINT_MIN_TEMP: f64 = -40.0;
pub const DEW_POINT_MAX_TEMP: f64 = 50.0;

/// Stull (2011) wet-bulb fit domain
pub const WET_BULB_MIN_TEMP: f64 = -20.0;
pub const WET_BULB_MAX_TEMP: f64 = 50.0;
pub const WET_BULB_MIN_HUMIDITY: f64 = 5.0;
pub const WET_BULB_MAX_HUMIDITY: f64 = 99.0;

// percentage points between measured and dew-point-implied humidity
pub const HUMIDITY_CONSISTENCY_TOLERANCE: f64 = 0.5;

/// Heat index / wind chill defaults
pub const HEAT_INDEX_MIN_TEMP: f64 = 27.0;
pub const HEAT_INDEX_MIN_HUMIDITY: f64 = 40.0;
pub const WIND_CHILL_MAX_TEMP: f64 = 10.0;
pub const WIND_CHILL_MIN_SPEED: f64 = 4.8;

/// Physical constants
pub const G0: f64 = 9.80665; // m/s²
pub const RD: f64 = 287.05; // J/(kg·K), dry air
pub const RV: f64 = 461.5; // J/(kg·K), water vapour
pub const EPSILON: f64 = 0.622; // Rd/Rv
pub const KAPPA: f64 = 0.286; // Rd/cp
pub const TV_COEF: f64 = 0.61;
pub const CP: f64 = 1004.0; // J/(kg·K)
pub const LV: f64 = 2.5e6; // J/kg
pub const LCL_METRES_PER_DEGREE: f64 = 125.0;
pub const KELVIN_OFFSET: f64 = 273.15;
pub const REFERENCE_PRESSURE_HPA: f64 = 1000.0;

/// Station altitude bounds (metres)
pub const MIN_ALTITUDE_M: f64 = -500.0;
pub const MAX_ALTITUDE_M: f64 = 9000.0;

/// Sensor-glitch defaults, per glitch window
pub const DEFAULT_TEMP_JUMP: f64 = 5.0;
pub const DEFAULT_HUMIDITY_JUMP: f64 = 25.0;
pub const DEFAULT_PRESSURE_JUMP: f64 = 3.0;

/// Polling defaults (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const MIN_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Tipping-bucket rain gauge
pub const RAIN_TIP_RESOLUTION_MM: f64 = 0.4;
pub const RAIN_QUANTIZE_CORRECTION: f64 = 1.0049;

/// Rain intensity upper bounds (mm/h)
pub const RAIN_TRACE: f64 = 0.4;
pub const RAIN_VERY_LIGHT: f64 = 1.0;
pub const RAIN_LIGHT: f64 = 2.5;
pub const RAIN_MODERATE_LIGHT: f64 = 6.5;
pub const RAIN_MODERATE: f64 = 16.0;
pub const RAIN_HEAVY: f64 = 40.0;
pub const RAIN_VERY_HEAVY: f64 = 100.0;

/// Rain-rate windows (seconds) and the rate assumed for a first tip (mm/h)
pub const RAIN_RATE_SHORT_WINDOW_SECS: i64 = 60;
pub const RAIN_RATE_LONG_WINDOW_SECS: i64 = 5 * 60;
pub const RAIN_FIRST_TIP_RATE: f64 = 0.4;
pub const RAIN_HISTORY_CAPACITY: usize = 2000;

/// Priestley-Taylor evapotranspiration (FAO-56 units)
pub const PT_ALPHA: f64 = 1.26;
pub const PT_LATENT_HEAT_MJ_KG: f64 = 2.45;
pub const PT_PSYCHROMETRIC_COEF: f64 = 0.665e-3; // per kPa
pub const PT_ALBEDO: f64 = 0.23;
pub const PT_INSTANT_TO_DAILY: f64 = 0.5;
pub const MJ_PER_WM2_DAY: f64 = 0.0864;
pub const ET0_HUMID_THRESHOLD: f64 = 80.0;
pub const ET0_HUMID_REDUCTION: f64 = 0.1;
pub const SOLAR_MAX_THEORETICAL: f64 = 1000.0; // W/m²

/// Pressure tendency
pub const PRESSURE_TREND_WINDOW_SECS: i64 = 3 * 3600;
pub const PRESSURE_HISTORY_SECS: i64 = 6 * 3600;
pub const PRESSURE_STABLE_THRESHOLD: f64 = 0.2;
pub const PRESSURE_RAPID_CHANGE: f64 = 2.0;

/// Outlook bands for the three-hour change (hPa)
pub const OUTLOOK_STEADY: f64 = 0.5;
pub const OUTLOOK_GRADUAL: f64 = 1.5;
pub const OUTLOOK_RAPID: f64 = 3.0;

/// Defaults for the station
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const WEATHER_UNDERGROUND_URL: &str = "https://api.weather.com/v2/pws/observations/current";
