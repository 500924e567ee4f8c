//! # Predict Module
//!
//! Engagement and emotional-tone prediction on top of a `ContentAnalysis`.
//! Both predictors are pure and run on the caller's task.

pub mod emotion;
pub mod engagement;

pub use emotion::{Emotion, EmotionPredictor, EmotionProfile, EmotionScore};
pub use engagement::{
    EngagementBucket, EngagementFactor, EngagementPrediction, EngagementPredictor,
};
