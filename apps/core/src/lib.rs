// Attune core
// Real-time content analysis and personalization engine

pub mod actors;
pub mod brain;
pub mod clock;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod learning;
pub mod models;
pub mod mood;
pub mod predict;
pub mod profile;
pub mod recommend;
pub mod telemetry;

pub use engine::{Engine, VisitOutcome};
pub use error::AppError;

#[cfg(test)]
mod tests;
