pub mod derived;
pub mod radiation;
pub mod rain;
pub mod thermodynamics;
pub mod trends;

pub use derived::{apparent_temperature, DerivationThresholds, DerivedCalculator};
pub use radiation::{SkyCondition, UvRisk, WaterBalanceClass};
pub use rain::{quantize_accumulation, RainGauge, RainIntensity, RainRates};
pub use trends::{PressureHistory, PressureOutlook, PressureTendency, PressureTrend};
