//! Continuous learning: periodic persistence, re-analysis and retraining.

pub mod retrain;
pub mod scheduler;

pub use retrain::{LoggingRetrainStrategy, RetrainBatch, RetrainStrategy};
pub use scheduler::{LearningScheduler, ScheduledTask, TaskReport, TaskRunner};
