use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::utils::constants::{
    RAIN_FIRST_TIP_RATE, RAIN_HEAVY, RAIN_HISTORY_CAPACITY, RAIN_LIGHT, RAIN_MODERATE,
    RAIN_MODERATE_LIGHT, RAIN_QUANTIZE_CORRECTION, RAIN_RATE_LONG_WINDOW_SECS,
    RAIN_RATE_SHORT_WINDOW_SECS, RAIN_TIP_RESOLUTION_MM, RAIN_TRACE, RAIN_VERY_HEAVY,
    RAIN_VERY_LIGHT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainIntensity {
    Dry,
    Trace,
    VeryLight,
    Light,
    ModerateLight,
    Moderate,
    Heavy,
    VeryHeavy,
    Torrential,
}

impl RainIntensity {
    /// Class for a precipitation rate in mm/h. `None` for non-finite input.
    pub fn classify(rate_mm_h: f64) -> Option<Self> {
        if !rate_mm_h.is_finite() {
            return None;
        }
        let intensity = if rate_mm_h <= 0.0 {
            RainIntensity::Dry
        } else if rate_mm_h < RAIN_TRACE {
            RainIntensity::Trace
        } else if rate_mm_h < RAIN_VERY_LIGHT {
            RainIntensity::VeryLight
        } else if rate_mm_h < RAIN_LIGHT {
            RainIntensity::Light
        } else if rate_mm_h < RAIN_MODERATE_LIGHT {
            RainIntensity::ModerateLight
        } else if rate_mm_h < RAIN_MODERATE {
            RainIntensity::Moderate
        } else if rate_mm_h < RAIN_HEAVY {
            RainIntensity::Heavy
        } else if rate_mm_h < RAIN_VERY_HEAVY {
            RainIntensity::VeryHeavy
        } else {
            RainIntensity::Torrential
        };
        Some(intensity)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RainIntensity::Dry => "No precipitation",
            RainIntensity::Trace => "Trace",
            RainIntensity::VeryLight => "Very light rain",
            RainIntensity::Light => "Light rain",
            RainIntensity::ModerateLight => "Light to moderate rain",
            RainIntensity::Moderate => "Moderate rain",
            RainIntensity::Heavy => "Heavy rain",
            RainIntensity::VeryHeavy => "Very heavy rain",
            RainIntensity::Torrential => "Torrential rain",
        }
    }

    pub fn is_raining(&self) -> bool {
        !matches!(self, RainIntensity::Dry)
    }
}

impl fmt::Display for RainIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snap a reported accumulation to whole tips of the 0.4 mm bucket, after
/// the gauge's calibration correction.
pub fn quantize_accumulation(total_mm: f64) -> f64 {
    let tips = (total_mm * RAIN_QUANTIZE_CORRECTION / RAIN_TIP_RESOLUTION_MM).round();
    tips * RAIN_TIP_RESOLUTION_MM
}

/// Rates (mm/h) recovered from the day's accumulation counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RainRates {
    /// Between the last two bucket tips.
    pub instantaneous: Option<f64>,
    pub one_minute: Option<f64>,
    pub five_minutes: Option<f64>,
}

/// Tip history of the daily accumulation counter.
///
/// Only readings where the total moved (and is above zero) are recorded. A
/// total lower than the last recorded one means the counter was reset,
/// normally at midnight, and the history starts over.
#[derive(Debug, Clone, Default)]
pub struct RainGauge {
    tips: VecDeque<(DateTime<Utc>, f64)>,
}

impl RainGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }

    /// Fold in the accumulation reported at `at` and return the current rates.
    pub fn push(&mut self, at: DateTime<Utc>, total_mm: f64) -> RainRates {
        if self
            .tips
            .back()
            .is_some_and(|&(_, last)| total_mm + 1e-6 < last)
        {
            self.tips.clear();
        }

        let moved = self
            .tips
            .back()
            .map_or(true, |&(_, last)| (total_mm - last).abs() > 1e-9);
        if total_mm > 1e-9 && moved {
            if self.tips.len() == RAIN_HISTORY_CAPACITY {
                self.tips.pop_front();
            }
            self.tips.push_back((at, total_mm));
        }

        RainRates {
            instantaneous: self.instantaneous(),
            one_minute: self.window_rate(at, total_mm, RAIN_RATE_SHORT_WINDOW_SECS),
            five_minutes: self.window_rate(at, total_mm, RAIN_RATE_LONG_WINDOW_SECS),
        }
    }

    fn instantaneous(&self) -> Option<f64> {
        let mut recent = self.tips.iter().rev();
        let &(t1, p1) = recent.next()?;
        match recent.next() {
            Some(&(t0, p0)) => {
                let dt = (t1 - t0).num_milliseconds() as f64 / 1000.0;
                let dp = p1 - p0;
                (dp > 0.0 && dt > 0.0).then(|| dp / dt * 3600.0)
            }
            None => Some(RAIN_FIRST_TIP_RATE),
        }
    }

    /// Average rate since the newest tip at or before `window` ago, or since
    /// the oldest tip when the history is shorter than the window.
    fn window_rate(&self, now: DateTime<Utc>, total_mm: f64, window_secs: i64) -> Option<f64> {
        let target = now - Duration::seconds(window_secs);
        let mut reference = *self.tips.front()?;
        for &(t, p) in self.tips.iter().rev() {
            if t <= target {
                reference = (t, p);
                break;
            }
        }

        let dt = (now - reference.0).num_milliseconds() as f64 / 1000.0;
        let dp = total_mm - reference.1;
        (dt > 0.0 && dp >= 0.0).then(|| dp / dt * 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 3, 14, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_dry_gauge_has_no_rates() {
        let mut gauge = RainGauge::new();
        assert_eq!(gauge.push(at(0), 0.0), RainRates::default());
        assert_eq!(gauge.push(at(60), 0.0), RainRates::default());
        assert!(gauge.is_empty());
    }

    #[test]
    fn test_first_tip_uses_default_rate() {
        let mut gauge = RainGauge::new();
        let rates = gauge.push(at(0), 0.4);
        assert_eq!(rates.instantaneous, Some(RAIN_FIRST_TIP_RATE));
        // a single point spans no time
        assert_eq!(rates.one_minute, None);
    }

    #[test]
    fn test_rates_between_tips() {
        let mut gauge = RainGauge::new();
        gauge.push(at(0), 0.4);
        gauge.push(at(60), 0.4);
        let rates = gauge.push(at(120), 0.8);

        // 0.4 mm in two minutes
        assert!((rates.instantaneous.unwrap() - 12.0).abs() < 1e-9);
        assert!((rates.five_minutes.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(gauge.len(), 2);

        // a minute later without a tip the one-minute rate averages over the gap
        let rates = gauge.push(at(180), 0.8);
        assert!((rates.one_minute.unwrap() - 0.0).abs() < 1e-9);
        assert!((rates.instantaneous.unwrap() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_counter_reset_clears_history() {
        let mut gauge = RainGauge::new();
        gauge.push(at(0), 2.0);
        gauge.push(at(60), 2.4);

        let rates = gauge.push(at(120), 0.4);
        assert_eq!(gauge.len(), 1);
        assert_eq!(rates.instantaneous, Some(RAIN_FIRST_TIP_RATE));
    }

    #[test]
    fn test_classify() {
        assert_eq!(RainIntensity::classify(0.0), Some(RainIntensity::Dry));
        assert_eq!(RainIntensity::classify(0.2), Some(RainIntensity::Trace));
        assert_eq!(RainIntensity::classify(0.4), Some(RainIntensity::VeryLight));
        assert_eq!(RainIntensity::classify(10.0), Some(RainIntensity::Moderate));
        assert_eq!(RainIntensity::classify(150.0), Some(RainIntensity::Torrential));
        assert_eq!(RainIntensity::classify(f64::NAN), None);
        assert!(!RainIntensity::Dry.is_raining());
        assert!(RainIntensity::Heavy > RainIntensity::Light);
    }

    #[test]
    fn test_quantize_accumulation() {
        assert_eq!(quantize_accumulation(0.0), 0.0);
        assert!((quantize_accumulation(0.79) - 0.8).abs() < 1e-9);
        assert!((quantize_accumulation(2.0) - 2.0).abs() < 1e-9);
        assert!((quantize_accumulation(1.05) - 1.2).abs() < 1e-9);
    }
}
