//! Training pipeline abstractions
//!
//! This module provides:
//! - A headless tick source that drives a [`crate::training::TrainingLoop`]
//! - Observers for progress display and episode metrics

pub mod observers;
pub mod training;

pub use observers::{EpisodeMetrics, MetricsObserver, MetricsSummary, ProgressObserver};
pub use training::{RunConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::Observer;
