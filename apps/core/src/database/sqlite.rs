use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use std::collections::VecDeque;
use std::str::FromStr;
use tracing::{debug, info};

use super::{from_millis, to_millis, ClearReport, ClearScope, ProfileStore};
use crate::error::AppError;
use crate::models::VisitRecord;
use crate::mood::{BehaviorMetrics, MoodLabel, MoodSample};
use crate::profile::{
    BehaviorPattern, ContentPreference, EvolutionEntry, FocusShare, Interest, PatternSnapshot,
    PersonalityEstimate, PersonalityTrait, PreferenceCategory, UserProfile,
};

/// Opens (creating if needed) the SQLite database at `db_url` and applies migrations.
pub async fn init_db(db_url: &str) -> Result<SqlitePool, AppError> {
    info!("Initializing database at: {}", db_url);

    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database initialized and migrations applied.");

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    created_at: i64,
    updated_at: i64,
    visit_count: i64,
    interaction_count: i64,
    interactions_since_retrain: i64,
    recent_focus: Json<Vec<FocusShare>>,
}

#[derive(sqlx::FromRow)]
struct InterestRow {
    topic: String,
    strength: f64,
    evolution: Json<VecDeque<EvolutionEntry>>,
    last_updated: i64,
}

impl From<InterestRow> for Interest {
    fn from(row: InterestRow) -> Self {
        Interest {
            topic: row.topic,
            strength: row.strength,
            evolution: row.evolution.0,
            last_updated: from_millis(row.last_updated),
        }
    }
}

#[derive(sqlx::FromRow)]
struct PatternRow {
    id: String,
    snapshot: Json<PatternSnapshot>,
    frequency: i64,
    contexts: Json<VecDeque<String>>,
    strength: f64,
    first_seen: i64,
    last_seen: i64,
}

#[derive(sqlx::FromRow)]
struct PreferenceRow {
    category: String,
    preferred: String,
    weight: f64,
    confidence: f64,
    observations: i64,
    updated_at: i64,
}

#[derive(sqlx::FromRow)]
struct PersonalityRow {
    trait_name: String,
    score: f64,
    confidence: f64,
}

#[derive(sqlx::FromRow)]
struct MoodRow {
    id: String,
    timestamp: i64,
    mood: String,
    confidence: f64,
    metrics: Json<BehaviorMetrics>,
}

impl TryFrom<MoodRow> for MoodSample {
    type Error = AppError;

    fn try_from(row: MoodRow) -> Result<Self, Self::Error> {
        Ok(MoodSample {
            id: row.id,
            timestamp: from_millis(row.timestamp),
            mood: MoodLabel::from_str(&row.mood)?,
            confidence: row.confidence,
            metrics: row.metrics.0,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VisitRow {
    id: String,
    user_id: String,
    url: String,
    title: String,
    category: String,
    engagement: f64,
    timestamp: i64,
}

impl From<VisitRow> for VisitRecord {
    fn from(row: VisitRow) -> Self {
        VisitRecord {
            id: row.id,
            user_id: row.user_id,
            url: row.url,
            title: row.title,
            category: row.category,
            engagement: row.engagement,
            timestamp: from_millis(row.timestamp),
        }
    }
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// `ProfileStore` over a SQLite pool. Numeric profile fields are REAL columns
/// so scores and confidences round-trip exactly.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    mood_history_cap: usize,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            mood_history_cap: 50,
        }
    }

    /// How many of the most recent mood samples `load_profile` restores.
    pub fn with_mood_history_cap(mut self, cap: usize) -> Self {
        self.mood_history_cap = cap;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for SqliteStore {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        let Some(row) = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, created_at, updated_at, visit_count, interaction_count,
                   interactions_since_retrain, recent_focus
            FROM profiles
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let mut profile = UserProfile::new(&row.user_id, from_millis(row.created_at));
        profile.updated_at = from_millis(row.updated_at);
        profile.visit_count = count(row.visit_count);
        profile.interaction_count = count(row.interaction_count);
        profile.interactions_since_retrain = count(row.interactions_since_retrain);
        profile.recent_focus = row.recent_focus.0;

        let interests = sqlx::query_as::<_, InterestRow>(
            "SELECT topic, strength, evolution, last_updated FROM interests WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        profile.interests = interests
            .into_iter()
            .map(|r| (r.topic.clone(), Interest::from(r)))
            .collect();

        let patterns = sqlx::query_as::<_, PatternRow>(
            r#"
            SELECT id, snapshot, frequency, contexts, strength, first_seen, last_seen
            FROM behavior_patterns
            WHERE user_id = ?
            ORDER BY first_seen, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        profile.behavior_patterns = patterns
            .into_iter()
            .map(|r| BehaviorPattern {
                id: r.id,
                snapshot: r.snapshot.0,
                frequency: count(r.frequency),
                contexts: r.contexts.0,
                strength: r.strength,
                first_seen: from_millis(r.first_seen),
                last_seen: from_millis(r.last_seen),
            })
            .collect();

        let preferences = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT category, preferred, weight, confidence, observations, updated_at
            FROM content_preferences
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        for r in preferences {
            let category = PreferenceCategory::from_str(&r.category)?;
            profile.preferences.insert(
                category,
                ContentPreference {
                    category,
                    preferred: r.preferred,
                    weight: r.weight,
                    confidence: r.confidence,
                    observations: count(r.observations),
                    updated_at: from_millis(r.updated_at),
                },
            );
        }

        let personality = sqlx::query_as::<_, PersonalityRow>(
            "SELECT trait AS trait_name, score, confidence FROM personality WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        for r in personality {
            let personality_trait = PersonalityTrait::from_str(&r.trait_name)?;
            profile.personality.insert(
                personality_trait,
                PersonalityEstimate {
                    personality_trait,
                    score: r.score,
                    confidence: r.confidence,
                },
            );
        }

        let moods = sqlx::query_as::<_, MoodRow>(
            r#"
            SELECT id, timestamp, mood, confidence, metrics
            FROM mood_samples
            WHERE user_id = ?
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(self.mood_history_cap as i64)
        .fetch_all(&self.pool)
        .await?;
        for r in moods.into_iter().rev() {
            profile.mood_history.push_back(MoodSample::try_from(r)?);
        }

        debug!(user_id, interests = profile.interests.len(), "Profile loaded");
        Ok(Some(profile))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        let user_id = profile.user_id.as_str();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, created_at, updated_at, visit_count, interaction_count,
                                  interactions_since_retrain, recent_focus)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                updated_at = excluded.updated_at,
                visit_count = excluded.visit_count,
                interaction_count = excluded.interaction_count,
                interactions_since_retrain = excluded.interactions_since_retrain,
                recent_focus = excluded.recent_focus
            "#,
        )
        .bind(user_id)
        .bind(to_millis(profile.created_at))
        .bind(to_millis(profile.updated_at))
        .bind(profile.visit_count as i64)
        .bind(profile.interaction_count as i64)
        .bind(profile.interactions_since_retrain as i64)
        .bind(Json(&profile.recent_focus))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM interests WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for interest in profile.interests.values() {
            sqlx::query(
                r#"
                INSERT INTO interests (user_id, topic, strength, evolution, last_updated)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(&interest.topic)
            .bind(interest.strength)
            .bind(Json(&interest.evolution))
            .bind(to_millis(interest.last_updated))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM behavior_patterns WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for pattern in &profile.behavior_patterns {
            sqlx::query(
                r#"
                INSERT INTO behavior_patterns
                    (id, user_id, signature, snapshot, frequency, contexts, strength, first_seen, last_seen)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&pattern.id)
            .bind(user_id)
            .bind(pattern.snapshot.signature())
            .bind(Json(&pattern.snapshot))
            .bind(pattern.frequency as i64)
            .bind(Json(&pattern.contexts))
            .bind(pattern.strength)
            .bind(to_millis(pattern.first_seen))
            .bind(to_millis(pattern.last_seen))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM content_preferences WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for pref in profile.preferences.values() {
            sqlx::query(
                r#"
                INSERT INTO content_preferences
                    (user_id, category, preferred, weight, confidence, observations, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(pref.category.as_str())
            .bind(&pref.preferred)
            .bind(pref.weight)
            .bind(pref.confidence)
            .bind(pref.observations as i64)
            .bind(to_millis(pref.updated_at))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM personality WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        for estimate in profile.personality.values() {
            sqlx::query(
                "INSERT INTO personality (user_id, trait, score, confidence) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(estimate.personality_trait.as_str())
            .bind(estimate.score)
            .bind(estimate.confidence)
            .execute(&mut *tx)
            .await?;
        }

        for sample in &profile.mood_history {
            sqlx::query(
                r#"
                INSERT OR IGNORE INTO mood_samples (id, user_id, timestamp, mood, confidence, metrics)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sample.id)
            .bind(user_id)
            .bind(to_millis(sample.timestamp))
            .bind(sample.mood.as_str())
            .bind(sample.confidence)
            .bind(Json(&sample.metrics))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(user_id, "Profile saved");
        Ok(())
    }

    async fn record_visit(&self, visit: &VisitRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO visits (id, user_id, url, title, category, engagement, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&visit.id)
        .bind(&visit.user_id)
        .bind(&visit.url)
        .bind(&visit.title)
        .bind(&visit.category)
        .bind(visit.engagement)
        .bind(to_millis(visit.timestamp))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn visits_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<VisitRecord>, AppError> {
        let rows = sqlx::query_as::<_, VisitRow>(
            r#"
            SELECT id, user_id, url, title, category, engagement, timestamp
            FROM visits
            WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp, id
            "#,
        )
        .bind(user_id)
        .bind(to_millis(from))
        .bind(to_millis(to))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(VisitRecord::from).collect())
    }

    async fn mood_samples_between(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MoodSample>, AppError> {
        let rows = sqlx::query_as::<_, MoodRow>(
            r#"
            SELECT id, timestamp, mood, confidence, metrics
            FROM mood_samples
            WHERE user_id = ? AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp, rowid
            "#,
        )
        .bind(user_id)
        .bind(to_millis(from))
        .bind(to_millis(to))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(MoodSample::try_from).collect()
    }

    async fn find_interest(&self, user_id: &str, topic: &str) -> Result<Option<Interest>, AppError> {
        let row = sqlx::query_as::<_, InterestRow>(
            r#"
            SELECT topic, strength, evolution, last_updated
            FROM interests
            WHERE user_id = ? AND topic = ?
            "#,
        )
        .bind(user_id)
        .bind(topic)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Interest::from))
    }

    async fn clear(
        &self,
        user_id: &str,
        scope: ClearScope,
        now: DateTime<Utc>,
    ) -> Result<ClearReport, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut report = ClearReport::default();

        match scope.cutoff(now) {
            None => {
                report.visits_removed = sqlx::query("DELETE FROM visits WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                report.mood_samples_removed =
                    sqlx::query("DELETE FROM mood_samples WHERE user_id = ?")
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                report.patterns_removed =
                    sqlx::query("DELETE FROM behavior_patterns WHERE user_id = ?")
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                for table in ["interests", "content_preferences", "personality"] {
                    sqlx::query(&format!("DELETE FROM {} WHERE user_id = ?", table))
                        .bind(user_id)
                        .execute(&mut *tx)
                        .await?;
                }
                report.profile_deleted = sqlx::query("DELETE FROM profiles WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
                    > 0;
            }
            Some(cutoff) => {
                let cutoff = to_millis(cutoff);
                report.visits_removed =
                    sqlx::query("DELETE FROM visits WHERE user_id = ? AND timestamp < ?")
                        .bind(user_id)
                        .bind(cutoff)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                report.mood_samples_removed =
                    sqlx::query("DELETE FROM mood_samples WHERE user_id = ? AND timestamp < ?")
                        .bind(user_id)
                        .bind(cutoff)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
            }
        }

        tx.commit().await?;
        info!(user_id, ?scope, "Privacy clear applied to store");
        Ok(report)
    }
}
