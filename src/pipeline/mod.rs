//! Training pipeline
//!
//! This module provides the tick-driven training loop and the observers
//! that record what happens during training.

pub mod observers;
pub mod training;

// Re-export observer implementations (adapters)
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver,
    SharedObserver, StepObservation,
};
pub use training::{
    TickEvents, TrainingConfig, TrainingLoop, TrainingResult, TrainingSnapshot, TrainingStats,
};

pub use crate::ports::Observer;
