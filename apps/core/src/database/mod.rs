//! Profile persistence.
//!
//! `ProfileStore` is the only seam between the engine and storage. The SQLite
//! implementation is used in production, the in-memory one for tests and
//! ephemeral runs.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::VisitRecord;
use crate::mood::MoodSample;
use crate::profile::{Interest, UserProfile};

pub use memory::MemoryStore;
pub use sqlite::{init_db, SqliteStore};

/// How much of a user's data a privacy clear removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "days", rename_all = "snake_case")]
pub enum ClearScope {
    /// Everything, including the profile itself
    All,
    /// Only records older than the given age
    #[serde(with = "days")]
    OlderThan(Duration),
}

impl ClearScope {
    /// Timestamp before which records are removed. `None` for everything.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ClearScope::All => None,
            ClearScope::OlderThan(age) => Some(now - *age),
        }
    }
}

mod days {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(age: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(age.num_days())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let days = i64::deserialize(deserializer)?;
        Duration::try_days(days).ok_or_else(|| serde::de::Error::custom("retention out of range"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    pub visits_removed: u64,
    pub mood_samples_removed: u64,
    pub patterns_removed: u64,
    pub evolution_entries_removed: u64,
    pub profile_deleted: bool,
}

/// Keyed storage for profiles plus the visit and mood logs.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Replaces the stored profile as a unit. Mood samples are appended, never rewritten.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError>;

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), AppError>;

    /// Visits with `from <= timestamp < to`, oldest first.
    async fn visits_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitRecord>, AppError>;

    /// Mood samples with `from <= timestamp < to`, oldest first.
    async fn mood_samples_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MoodSample>, AppError>;

    async fn find_interest(&self, user_id: &str, topic: &str) -> Result<Option<Interest>, AppError>;

    /// Removes stored data in `scope`. Store-side counts only; the caller adds
    /// what it trimmed from memory.
    async fn clear(
        &self,
        user_id: &str,
        scope: ClearScope,
        now: DateTime<Utc>,
    ) -> Result<ClearReport, AppError>;
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_cutoff() {
        let now = Utc::now();
        assert_eq!(ClearScope::All.cutoff(now), None);
        assert_eq!(
            ClearScope::OlderThan(Duration::days(30)).cutoff(now),
            Some(now - Duration::days(30))
        );
    }

    #[test]
    fn test_scope_from_json() {
        let scope: ClearScope = serde_json::from_str(r#"{"scope":"older_than","days":7}"#).unwrap();
        assert_eq!(scope, ClearScope::OlderThan(Duration::days(7)));
        let scope: ClearScope = serde_json::from_str(r#"{"scope":"all"}"#).unwrap();
        assert_eq!(scope, ClearScope::All);
    }

    #[test]
    fn test_millis_round_trip() {
        let at = from_millis(1_714_557_600_123);
        assert_eq!(to_millis(at), 1_714_557_600_123);
    }
}
