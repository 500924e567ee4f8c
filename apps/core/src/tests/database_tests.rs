//! Database Module Tests
//!
//! The SQLite store on a temporary file: profile round trips, the visit and
//! mood logs, and privacy clears.

use super::fixtures::{analyze, engagement, sports_visit, t0, tech_visit, visit};
use crate::database::{init_db, ClearScope, ProfileStore, SqliteStore};
use crate::models::{VisitContext, VisitRecord};
use crate::mood::{BehaviorMetrics, MoodLabel, MoodSample};
use crate::profile::{InterestTracker, UserProfile};
use chrono::{DateTime, Duration, Utc};
use tempfile::{tempdir, TempDir};

/// Store on a fresh database file. Keep the `TempDir` alive for the test.
async fn create_test_store() -> (SqliteStore, TempDir, String) {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("attune.sqlite");
    let db_url = format!("sqlite://{}", db_path.display());
    let pool = init_db(&db_url).await.expect("Failed to init database");
    (SqliteStore::new(pool), dir, db_url)
}

/// A profile shaped by a mix of visits, so every table has rows.
fn trained_profile() -> UserProfile {
    let tracker = InterestTracker::default();
    let mut profile = UserProfile::new("u1", t0());
    let pages = [
        tech_visit(t0()),
        sports_visit(t0() + Duration::minutes(5)),
        tech_visit(t0() + Duration::minutes(10)),
        visit(
            "https://news.example/vote",
            "The government and the senate agreed on the election law before the vote.",
            t0() + Duration::minutes(15),
        ),
        tech_visit(t0() + Duration::minutes(20)),
    ];
    for (i, page) in pages.iter().enumerate() {
        let score = 0.55 + 0.07 * i as f64;
        profile = tracker
            .apply(&profile, &analyze(page), &engagement(score), &VisitContext::from(page))
            .unwrap();
    }
    profile
}

fn mood_at(at: DateTime<Utc>, mood: MoodLabel) -> MoodSample {
    MoodSample::new(
        at,
        mood,
        0.6,
        BehaviorMetrics {
            event_count: 9,
            ..BehaviorMetrics::default()
        },
    )
}

fn visit_record(id: &str, at: DateTime<Utc>) -> VisitRecord {
    VisitRecord {
        id: id.to_string(),
        user_id: "u1".to_string(),
        url: format!("https://dev.example/{}", id),
        title: String::new(),
        category: "technology".to_string(),
        engagement: 0.7,
        timestamp: at,
    }
}

#[cfg(test)]
mod profile_round_trip_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_ranking_and_confidences() {
        let (store, _dir, _) = create_test_store().await;
        let profile = trained_profile();
        store.save_profile(&profile).await.unwrap();

        let loaded = store.load_profile("u1").await.unwrap().expect("profile exists");

        let rank = |p: &UserProfile| -> Vec<(String, f64)> {
            p.top_interests(5)
                .into_iter()
                .map(|i| (i.topic.clone(), i.strength))
                .collect()
        };
        assert_eq!(rank(&loaded), rank(&profile));
        assert_eq!(loaded.personality, profile.personality);
        assert_eq!(loaded.preferences, profile.preferences);
        assert_eq!(loaded.behavior_patterns.len(), profile.behavior_patterns.len());
        assert_eq!(loaded.visit_count, 5);
        assert_eq!(loaded.created_at, profile.created_at);
    }

    #[tokio::test]
    async fn test_profile_survives_reopening_the_file() {
        let (store, _dir, db_url) = create_test_store().await;
        let profile = trained_profile();
        store.save_profile(&profile).await.unwrap();
        store.pool().close().await;

        let reopened = SqliteStore::new(init_db(&db_url).await.unwrap());
        let loaded = reopened.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(
            loaded.interest_strength("technology"),
            profile.interest_strength("technology")
        );
        let found = reopened.find_interest("u1", "technology").await.unwrap().unwrap();
        assert_eq!(found.strength, profile.interest_strength("technology"));
        assert!(reopened.find_interest("u1", "gardening").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_dropped_interests() {
        let (store, _dir, _) = create_test_store().await;
        let mut profile = trained_profile();
        store.save_profile(&profile).await.unwrap();

        profile.interests.retain(|topic, _| topic == "technology");
        store.save_profile(&profile).await.unwrap();

        let loaded = store.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(loaded.interests.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_none() {
        let (store, _dir, _) = create_test_store().await;
        assert!(store.load_profile("nobody").await.unwrap().is_none());
    }
}

#[cfg(test)]
mod log_tests {
    use super::*;

    #[tokio::test]
    async fn test_visit_range_is_half_open() {
        let (store, _dir, _) = create_test_store().await;
        for (i, minutes) in [0, 10, 20, 30].iter().enumerate() {
            store
                .record_visit(&visit_record(&format!("v{}", i), t0() + Duration::minutes(*minutes)))
                .await
                .unwrap();
        }

        let found = store
            .visits_between("u1", t0() + Duration::minutes(10), t0() + Duration::minutes(30))
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2"]);
        assert_eq!(found[0].timestamp, t0() + Duration::minutes(10));
        assert!(store
            .visits_between("u2", t0(), t0() + Duration::hours(1))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mood_log_is_append_only() {
        let (store, _dir, _) = create_test_store().await;
        let mut profile = UserProfile::new("u1", t0());
        profile.push_mood(mood_at(t0(), MoodLabel::Focused), 2);
        profile.push_mood(mood_at(t0() + Duration::minutes(1), MoodLabel::Relaxed), 2);
        store.save_profile(&profile).await.unwrap();

        // the oldest sample leaves the in-memory history but stays logged
        profile.push_mood(mood_at(t0() + Duration::minutes(2), MoodLabel::Exploring), 2);
        store.save_profile(&profile).await.unwrap();

        let logged = store
            .mood_samples_between("u1", t0(), t0() + Duration::hours(1))
            .await
            .unwrap();
        let moods: Vec<MoodLabel> = logged.iter().map(|s| s.mood).collect();
        assert_eq!(
            moods,
            vec![MoodLabel::Focused, MoodLabel::Relaxed, MoodLabel::Exploring]
        );

        let loaded = store.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(loaded.mood_history.len(), 3);
        assert_eq!(loaded.current_mood().map(|s| s.mood), Some(MoodLabel::Exploring));
    }

    #[tokio::test]
    async fn test_mood_samples_sharing_a_timestamp_survive_reload() {
        let (store, _dir, _) = create_test_store().await;
        let mut profile = UserProfile::new("u1", t0());
        profile.push_mood(
            MoodSample::new(t0(), MoodLabel::Focused, 0.8, BehaviorMetrics::default()),
            50,
        );
        profile.push_mood(
            MoodSample::new(t0(), MoodLabel::Distracted, 0.3, BehaviorMetrics::default()),
            50,
        );
        store.save_profile(&profile).await.unwrap();
        // saving again must not duplicate rows
        store.save_profile(&profile).await.unwrap();

        let loaded = store.load_profile("u1").await.unwrap().unwrap();
        assert_eq!(loaded.mood_history, profile.mood_history);
        assert_eq!(
            loaded.current_mood().map(|s| (s.mood, s.confidence)),
            Some((MoodLabel::Distracted, 0.3))
        );

        let logged = store
            .mood_samples_between("u1", t0(), t0() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(logged.len(), 2);
    }
}

#[cfg(test)]
mod clear_tests {
    use super::*;

    async fn seeded_store() -> (SqliteStore, TempDir) {
        let (store, dir, _) = create_test_store().await;
        let mut profile = trained_profile();
        profile.push_mood(mood_at(t0() - Duration::days(10), MoodLabel::Neutral), 50);
        profile.push_mood(mood_at(t0() - Duration::days(1), MoodLabel::Focused), 50);
        store.save_profile(&profile).await.unwrap();
        store.record_visit(&visit_record("old", t0() - Duration::days(10))).await.unwrap();
        store.record_visit(&visit_record("new", t0() - Duration::days(1))).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_clear_older_than_keeps_recent_rows() {
        let (store, _dir) = seeded_store().await;

        let report = store
            .clear("u1", ClearScope::OlderThan(Duration::days(7)), t0())
            .await
            .unwrap();
        assert_eq!(report.visits_removed, 1);
        assert_eq!(report.mood_samples_removed, 1);
        assert!(!report.profile_deleted);

        let remaining = store
            .visits_between("u1", t0() - Duration::days(30), t0())
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "new");
        assert!(store.load_profile("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all_removes_everything() {
        let (store, _dir) = seeded_store().await;

        let report = store.clear("u1", ClearScope::All, t0()).await.unwrap();
        assert!(report.profile_deleted);
        assert_eq!(report.visits_removed, 2);
        assert_eq!(report.mood_samples_removed, 2);
        assert!(report.patterns_removed > 0);

        assert!(store.load_profile("u1").await.unwrap().is_none());
        assert!(store.find_interest("u1", "technology").await.unwrap().is_none());
        assert!(store
            .mood_samples_between("u1", t0() - Duration::days(30), t0())
            .await
            .unwrap()
            .is_empty());
    }
}
