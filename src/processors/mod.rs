pub mod dashboard_feed;
pub mod extrema_tracker;
pub mod observation_pipeline;
pub mod poller;
pub mod reading_validator;

pub use dashboard_feed::{DashboardFeed, DashboardState};
pub use extrema_tracker::{ExtremaTracker, TrackerUpdate};
pub use observation_pipeline::ObservationPipeline;
pub use poller::{poll, CycleOutcome};
pub use reading_validator::{GlitchThresholds, ReadingValidator};
