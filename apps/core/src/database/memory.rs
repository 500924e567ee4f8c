use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ClearReport, ClearScope, ProfileStore};
use crate::error::AppError;
use crate::models::VisitRecord;
use crate::mood::MoodSample;
use crate::profile::{Interest, UserProfile};

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, UserProfile>,
    visits: Vec<VisitRecord>,
    mood_samples: Vec<(String, MoodSample)>,
}

/// Process-local store. Same contract as the SQLite store, nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(user_id).cloned())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        for sample in &profile.mood_history {
            let exists = tables.mood_samples.iter().any(|(_, s)| s.id == sample.id);
            if !exists {
                tables
                    .mood_samples
                    .push((profile.user_id.clone(), sample.clone()));
            }
        }
        tables
            .profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), AppError> {
        self.tables.write().await.visits.push(visit.clone());
        Ok(())
    }

    async fn visits_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitRecord>, AppError> {
        let tables = self.tables.read().await;
        let mut visits: Vec<VisitRecord> = tables
            .visits
            .iter()
            .filter(|v| v.user_id == user_id && v.timestamp >= from && v.timestamp < to)
            .cloned()
            .collect();
        visits.sort_by_key(|v| v.timestamp);
        Ok(visits)
    }

    async fn mood_samples_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MoodSample>, AppError> {
        let tables = self.tables.read().await;
        let mut samples: Vec<MoodSample> = tables
            .mood_samples
            .iter()
            .filter(|(user, s)| user == user_id && s.timestamp >= from && s.timestamp < to)
            .map(|(_, s)| s.clone())
            .collect();
        samples.sort_by_key(|s| s.timestamp);
        Ok(samples)
    }

    async fn find_interest(&self, user_id: &str, topic: &str) -> Result<Option<Interest>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .profiles
            .get(user_id)
            .and_then(|p| p.interests.get(topic))
            .cloned())
    }

    async fn clear(
        &self,
        user_id: &str,
        scope: ClearScope,
        now: DateTime<Utc>,
    ) -> Result<ClearReport, AppError> {
        let mut tables = self.tables.write().await;
        let cutoff = scope.cutoff(now);
        let doomed = |owner: &str, at: DateTime<Utc>| {
            owner == user_id && cutoff.map_or(true, |cutoff| at < cutoff)
        };

        let visits = tables.visits.len();
        tables.visits.retain(|v| !doomed(&v.user_id, v.timestamp));
        let moods = tables.mood_samples.len();
        tables.mood_samples.retain(|(user, s)| !doomed(user, s.timestamp));

        let mut report = ClearReport {
            visits_removed: (visits - tables.visits.len()) as u64,
            mood_samples_removed: (moods - tables.mood_samples.len()) as u64,
            ..Default::default()
        };
        if cutoff.is_none() {
            report.profile_deleted = tables.profiles.remove(user_id).is_some();
        }
        Ok(report)
    }
}
