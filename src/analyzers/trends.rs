use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::utils::constants::{
    OUTLOOK_GRADUAL, OUTLOOK_RAPID, OUTLOOK_STEADY, PRESSURE_HISTORY_SECS, PRESSURE_RAPID_CHANGE,
    PRESSURE_STABLE_THRESHOLD, PRESSURE_TREND_WINDOW_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureTendency {
    Stable,
    Rising,
    RisingRapidly,
    Falling,
    FallingRapidly,
}

impl PressureTendency {
    pub fn from_change(change_hpa: f64) -> Self {
        if change_hpa.abs() < PRESSURE_STABLE_THRESHOLD {
            PressureTendency::Stable
        } else if change_hpa > PRESSURE_RAPID_CHANGE {
            PressureTendency::RisingRapidly
        } else if change_hpa > 0.0 {
            PressureTendency::Rising
        } else if change_hpa < -PRESSURE_RAPID_CHANGE {
            PressureTendency::FallingRapidly
        } else {
            PressureTendency::Falling
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            PressureTendency::Stable => "→",
            PressureTendency::Rising => "↗",
            PressureTendency::RisingRapidly => "⬆",
            PressureTendency::Falling => "↘",
            PressureTendency::FallingRapidly => "⬇",
        }
    }
}

impl fmt::Display for PressureTendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PressureTendency::Stable => "steady",
            PressureTendency::Rising => "rising",
            PressureTendency::RisingRapidly => "rising rapidly",
            PressureTendency::Falling => "falling",
            PressureTendency::FallingRapidly => "falling rapidly",
        };
        f.write_str(label)
    }
}

/// Rule-of-thumb weather outlook from the three-hour pressure change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureOutlook {
    Settled,
    RapidImprovement,
    GradualImprovement,
    SlightImprovement,
    RapidDeterioration,
    GradualDeterioration,
    SlightDeterioration,
}

impl PressureOutlook {
    pub fn from_change(change_hpa: f64) -> Self {
        if change_hpa.abs() < OUTLOOK_STEADY {
            PressureOutlook::Settled
        } else if change_hpa > OUTLOOK_RAPID {
            PressureOutlook::RapidImprovement
        } else if change_hpa > OUTLOOK_GRADUAL {
            PressureOutlook::GradualImprovement
        } else if change_hpa > 0.0 {
            PressureOutlook::SlightImprovement
        } else if change_hpa < -OUTLOOK_RAPID {
            PressureOutlook::RapidDeterioration
        } else if change_hpa < -OUTLOOK_GRADUAL {
            PressureOutlook::GradualDeterioration
        } else {
            PressureOutlook::SlightDeterioration
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PressureOutlook::Settled => "Settled conditions",
            PressureOutlook::RapidImprovement => "Rapid improvement, high pressure moving in",
            PressureOutlook::GradualImprovement => "Gradual improvement, clearing skies",
            PressureOutlook::SlightImprovement => "Slight improvement",
            PressureOutlook::RapidDeterioration => "Rapid deterioration, possible storm",
            PressureOutlook::GradualDeterioration => "Gradual deterioration, rain likely",
            PressureOutlook::SlightDeterioration => "Slight deterioration",
        }
    }
}

impl fmt::Display for PressureOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureTrend {
    /// hPa over the span
    pub change: f64,
    pub rate_per_hour: f64,
    pub span_secs: i64,
    pub tendency: PressureTendency,
    pub outlook: PressureOutlook,
}

/// Sea-level pressure history of accepted readings, trimmed to six hours.
#[derive(Debug, Clone)]
pub struct PressureHistory {
    points: VecDeque<(DateTime<Utc>, f64)>,
    retention: Duration,
    window: Duration,
}

impl Default for PressureHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PressureHistory {
    pub fn new() -> Self {
        Self {
            points: VecDeque::new(),
            retention: Duration::seconds(PRESSURE_HISTORY_SECS),
            window: Duration::seconds(PRESSURE_TREND_WINDOW_SECS),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points that are not newer than the last one are ignored.
    pub fn push(&mut self, at: DateTime<Utc>, pressure_hpa: f64) {
        if self.points.back().is_some_and(|(last, _)| at <= *last) {
            return;
        }
        self.points.push_back((at, pressure_hpa));

        let horizon = at - self.retention;
        while self.points.front().is_some_and(|(t, _)| *t < horizon) {
            self.points.pop_front();
        }
    }

    /// Change from the newest point back to the point closest to, but not
    /// after, three hours earlier (or the oldest point when history is shorter).
    pub fn trend(&self) -> Option<PressureTrend> {
        if self.points.len() < 2 {
            return None;
        }
        let &(t_now, p_now) = self.points.back()?;
        let target = t_now - self.window;

        let mut reference = *self.points.front()?;
        for &(t, p) in &self.points {
            if t <= target {
                reference = (t, p);
            } else {
                break;
            }
        }

        let span = (t_now - reference.0).num_seconds();
        if span <= 0 {
            return None;
        }
        let change = p_now - reference.1;

        Some(PressureTrend {
            change,
            rate_per_hour: change / (span as f64 / 3600.0),
            span_secs: span,
            tendency: PressureTendency::from_change(change),
            outlook: PressureOutlook::from_change(change),
        })
    }
}
