//! Mood Tests
//!
//! Mood inference through the engine: the interaction window lives in the
//! profile actor and samples land in the profile's mood history.

use super::fixtures::{memory_engine, t0};
use crate::clock::Clock;
use crate::models::{InteractionEvent, InteractionKind};
use crate::mood::MoodLabel;
use chrono::{DateTime, Duration, Utc};

/// `count` events of `kind`, `gap_ms` apart, the last one at `end`.
fn burst(kind: InteractionKind, count: i64, gap_ms: i64, end: DateTime<Utc>) -> Vec<InteractionEvent> {
    (0..count)
        .map(|i| InteractionEvent::new(kind, end - Duration::milliseconds(gap_ms * (count - 1 - i))))
        .collect()
}

#[cfg(test)]
mod inference_tests {
    use super::*;

    #[tokio::test]
    async fn test_four_events_are_insufficient() {
        let (engine, _, _) = memory_engine();
        let accepted = engine
            .record_interactions("u1", burst(InteractionKind::Click, 4, 1_000, t0()))
            .await
            .unwrap();
        assert_eq!(accepted, 4);

        let sample = engine.current_mood("u1").await;
        assert_eq!(sample.mood, MoodLabel::InsufficientData);
        assert_eq!(sample.confidence, 0.0);
        assert_eq!(sample.metrics.event_count, 4);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_typing_burst_is_productive() {
        let (engine, _, _) = memory_engine();
        engine
            .record_interactions("u1", burst(InteractionKind::Keyboard, 12, 1_000, t0()))
            .await
            .unwrap();

        let sample = engine.current_mood("u1").await;
        assert_eq!(sample.mood, MoodLabel::Productive);
        assert!(sample.confidence > 0.0 && sample.confidence <= 1.0);

        let profile = engine.profile("u1").await.unwrap();
        assert_eq!(profile.current_mood().map(|s| s.mood), Some(MoodLabel::Productive));
        assert_eq!(profile.interaction_count, 12);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_events_leave_the_window() {
        let (engine, _, clock) = memory_engine();
        engine
            .record_interactions("u1", burst(InteractionKind::Keyboard, 12, 1_000, t0()))
            .await
            .unwrap();

        clock.advance(Duration::hours(1));
        let sample = engine.current_mood("u1").await;
        assert_eq!(sample.mood, MoodLabel::InsufficientData);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let (engine, _, clock) = memory_engine();
        let cap = engine.config().mood.history_cap;
        for _ in 0..(cap + 7) {
            clock.advance(Duration::seconds(1));
            engine.current_mood("u1").await;
        }

        let profile = engine.profile("u1").await.unwrap();
        assert_eq!(profile.mood_history.len(), cap);
        // oldest evicted first
        let first = profile.mood_history.front().map(|s| s.timestamp);
        assert_eq!(first, Some(t0() + Duration::seconds(8)));
        assert_eq!(profile.mood_history.back().map(|s| s.timestamp), Some(clock.now()));
        engine.shutdown().await.unwrap();
    }
}
