pub mod tracker;

pub use tracker::{EpisodeRecord, MetricsTracker, TrainingMetrics};
