//! Test Module
//!
//! Cross-module test suite for the personalization engine.
//!
//! ## Test Categories
//! - `analyzer_tests`: Determinism, readability scenario, fallback analysis
//! - `profile_tests`: Interest growth and decay, strength bounds
//! - `mood_tests`: Mood inference through the profile actor
//! - `actor_tests`: Atomic visit updates, concurrency, shutdown
//! - `scheduler_tests`: Scheduled tasks, timers and retraining
//! - `database_tests`: SQLite round trips, range queries, privacy clear
//! - `integration_tests`: Full engine workflows


pub mod analyzer_tests;
pub mod database_tests;
pub mod mood_tests;
pub mod scheduler_tests;
