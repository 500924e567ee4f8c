//! Engine configuration.
//!
//! Every tunable constant of the personalization pipeline lives here so that
//! separate engine instances (and tests) can run side by side with different
//! settings. Values come from `Default`, then `ATTUNE_*` environment variables
//! (a `.env` file is honoured), and are validated before use.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Tunables for the interest and preference tracker.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackerConfig {
    /// Multiplicative decay applied to an interest on every visit.
    #[validate(range(min = 0.0, max = 1.0))]
    pub interest_decay: f64,
    /// Scale of the reinforcement term `engagement * relevance * rate`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub reinforcement_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub keyword_relevance: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub category_relevance: f64,
    /// New keyword interests start at `engagement * keyword_initial_factor`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub keyword_initial_factor: f64,
    /// New category interests start at `engagement * category_initial_factor`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub category_initial_factor: f64,
    /// Interests that decay below this strength are dropped from the profile.
    #[validate(range(min = 0.0, max = 0.1))]
    pub prune_floor: f64,
    #[validate(range(min = 1, max = 1000))]
    pub evolution_cap: usize,
    #[validate(range(min = 1))]
    pub max_interests: usize,
    #[validate(range(min = 0.0, max = 1.0))]
    pub preference_momentum: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub preference_confidence_step: f64,
    /// Below this weight the preferred value migrates to the latest observation.
    #[validate(range(min = 0.0, max = 1.0))]
    pub preference_switch_threshold: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub personality_momentum: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub personality_confidence_step: f64,
    /// Merge identical behavior snapshots into one record with a frequency counter.
    pub aggregate_behavior_patterns: bool,
    #[validate(range(min = 1))]
    pub max_behavior_patterns: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interest_decay: 0.95,
            reinforcement_rate: 0.1,
            keyword_relevance: 0.5,
            category_relevance: 0.7,
            keyword_initial_factor: 0.3,
            category_initial_factor: 0.5,
            prune_floor: 0.001,
            evolution_cap: 20,
            max_interests: 500,
            preference_momentum: 0.9,
            preference_confidence_step: 0.05,
            preference_switch_threshold: 0.3,
            personality_momentum: 0.9,
            personality_confidence_step: 0.02,
            aggregate_behavior_patterns: true,
            max_behavior_patterns: 200,
        }
    }
}

/// Tunables for mood inference.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MoodConfig {
    /// Below this many events the classifier answers `insufficient_data`.
    #[validate(range(min = 1))]
    pub min_events: usize,
    #[validate(range(min = 1))]
    pub window_capacity: usize,
    #[validate(range(min = 1))]
    pub window_secs: u64,
    #[validate(range(min = 1))]
    pub history_cap: usize,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            min_events: 5,
            window_capacity: 200,
            window_secs: 600,
            history_cap: 50,
        }
    }
}

/// Intervals of the continuous learning scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    #[validate(range(min = 1))]
    pub persist_interval_secs: u64,
    #[validate(range(min = 1))]
    pub reanalyze_interval_secs: u64,
    #[validate(range(min = 1))]
    pub retrain_check_interval_secs: u64,
    /// Interactions a profile must accumulate before the retraining hook fires.
    #[validate(range(min = 1))]
    pub retrain_every_interactions: u64,
    /// Look-back window used by re-analysis for "recent" patterns.
    #[validate(range(min = 1))]
    pub recent_window_hours: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            persist_interval_secs: 300,
            reanalyze_interval_secs: 60,
            retrain_check_interval_secs: 30,
            retrain_every_interactions: 100,
            recent_window_hours: 24,
        }
    }
}

impl SchedulerConfig {
    pub fn persist_interval(&self) -> Duration {
        Duration::from_secs(self.persist_interval_secs)
    }

    pub fn reanalyze_interval(&self) -> Duration {
        Duration::from_secs(self.reanalyze_interval_secs)
    }

    pub fn retrain_check_interval(&self) -> Duration {
        Duration::from_secs(self.retrain_check_interval_secs)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// SQLite URL (e.g. `sqlite://data/attune.sqlite`). `None` keeps profiles in memory.
    pub database_url: Option<String>,
    #[validate(range(min = 1, max = 4096))]
    pub mailbox_capacity: usize,
    /// Upper bound on how long a caller waits for a profile actor to answer.
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    #[validate(nested)]
    pub tracker: TrackerConfig,
    #[validate(nested)]
    pub mood: MoodConfig,
    #[validate(nested)]
    pub scheduler: SchedulerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            mailbox_capacity: 32,
            request_timeout_secs: 10,
            tracker: TrackerConfig::default(),
            mood: MoodConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Builds the configuration from defaults plus `ATTUNE_*` environment overrides.
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(url) = std::env::var("ATTUNE_DATABASE_URL") {
            if !url.trim().is_empty() {
                config.database_url = Some(url);
            }
        }
        override_from_env("ATTUNE_MAILBOX_CAPACITY", &mut config.mailbox_capacity)?;
        override_from_env("ATTUNE_REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;

        let tracker = &mut config.tracker;
        override_from_env("ATTUNE_INTEREST_DECAY", &mut tracker.interest_decay)?;
        override_from_env("ATTUNE_EVOLUTION_CAP", &mut tracker.evolution_cap)?;
        override_from_env("ATTUNE_MAX_INTERESTS", &mut tracker.max_interests)?;
        override_from_env(
            "ATTUNE_AGGREGATE_BEHAVIOR_PATTERNS",
            &mut tracker.aggregate_behavior_patterns,
        )?;

        let mood = &mut config.mood;
        override_from_env("ATTUNE_MOOD_MIN_EVENTS", &mut mood.min_events)?;
        override_from_env("ATTUNE_MOOD_WINDOW_SECS", &mut mood.window_secs)?;

        let scheduler = &mut config.scheduler;
        override_from_env("ATTUNE_PERSIST_INTERVAL_SECS", &mut scheduler.persist_interval_secs)?;
        override_from_env(
            "ATTUNE_REANALYZE_INTERVAL_SECS",
            &mut scheduler.reanalyze_interval_secs,
        )?;
        override_from_env(
            "ATTUNE_RETRAIN_CHECK_INTERVAL_SECS",
            &mut scheduler.retrain_check_interval_secs,
        )?;
        override_from_env("ATTUNE_RETRAIN_EVERY", &mut scheduler.retrain_every_interactions)?;

        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn override_from_env<T>(key: &str, target: &mut T) -> Result<(), AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => {
            *target = raw
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{} = {:?}: {}", key, raw, e)))?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}
