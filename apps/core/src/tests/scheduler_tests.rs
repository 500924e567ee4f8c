//! Scheduler Tests
//!
//! Scheduled tasks driven directly through `run_task`, and the timers driven
//! by paused tokio time.

use super::fixtures::{engine_with, memory_engine, t0, tech_visit};
use crate::clock::ManualClock;
use crate::config::{EngineConfig, SchedulerConfig};
use crate::database::{MemoryStore, ProfileStore};
use crate::error::AppError;
use crate::learning::{LearningScheduler, RetrainBatch, RetrainStrategy, ScheduledTask};
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};

/// Records every batch it is handed.
#[derive(Default)]
struct RecordingStrategy {
    batches: Mutex<Vec<RetrainBatch>>,
    fail: bool,
}

impl RecordingStrategy {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl RetrainStrategy for RecordingStrategy {
    async fn retrain(&self, batch: RetrainBatch) -> Result<(), AppError> {
        self.batches.lock().unwrap().push(batch);
        if self.fail {
            return Err(AppError::Internal("retraining backend down".to_string()));
        }
        Ok(())
    }
}

fn config_with(scheduler: SchedulerConfig) -> EngineConfig {
    EngineConfig {
        scheduler,
        ..EngineConfig::default()
    }
}

#[cfg(test)]
mod run_task_tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_saves_changed_profiles_once() {
        let (engine, store, _) = memory_engine();
        engine.process_visit("u1", tech_visit(t0())).await;
        engine.profile("u2").await.unwrap();

        let report = engine.task_runner().run_task(ScheduledTask::Persist).await.unwrap();
        assert_eq!(report.profiles, 2);
        assert_eq!(report.affected, 1);
        assert_eq!(report.failed, 0);
        assert!(store.load_profile("u1").await.unwrap().is_some());
        assert!(store.load_profile("u2").await.unwrap().is_none());

        let again = engine.task_runner().run_task(ScheduledTask::Persist).await.unwrap();
        assert_eq!(again.affected, 0);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_reanalyze_refreshes_recent_focus() {
        let (engine, _, clock) = memory_engine();
        for i in 0..3 {
            engine
                .process_visit("u1", tech_visit(t0() + ChronoDuration::minutes(i)))
                .await;
        }
        clock.advance(ChronoDuration::hours(1));

        let report = engine.task_runner().run_task(ScheduledTask::Reanalyze).await.unwrap();
        assert_eq!(report.affected, 1);

        let profile = engine.profile("u1").await.unwrap();
        assert_eq!(profile.recent_focus.len(), 1);
        assert_eq!(profile.recent_focus[0].category, "technology");
        assert!((profile.recent_focus[0].share - 1.0).abs() < 1e-9);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_retrain_fires_at_threshold() {
        let strategy = Arc::new(RecordingStrategy::default());
        let engine = engine_with(
            config_with(SchedulerConfig {
                retrain_every_interactions: 3,
                ..SchedulerConfig::default()
            }),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(t0())),
            strategy.clone(),
        );

        for i in 0..2 {
            engine.process_visit("u1", tech_visit(t0() + ChronoDuration::seconds(i))).await;
        }
        let report = engine.task_runner().run_task(ScheduledTask::RetrainCheck).await.unwrap();
        assert_eq!(report.affected, 0);
        assert_eq!(strategy.count(), 0);

        engine.process_visit("u1", tech_visit(t0() + ChronoDuration::seconds(2))).await;
        let report = engine.task_runner().run_task(ScheduledTask::RetrainCheck).await.unwrap();
        assert_eq!(report.affected, 1);
        {
            let batches = strategy.batches.lock().unwrap();
            assert_eq!(batches.len(), 1);
            assert_eq!(batches[0].user_id, "u1");
            assert_eq!(batches[0].interactions, 3);
            assert_eq!(batches[0].profile.visit_count, 3);
        }

        // counter restarts after a trigger
        let report = engine.task_runner().run_task(ScheduledTask::RetrainCheck).await.unwrap();
        assert_eq!(report.affected, 0);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_failing_strategy_is_reported() {
        let strategy = Arc::new(RecordingStrategy::failing());
        let engine = engine_with(
            config_with(SchedulerConfig {
                retrain_every_interactions: 1,
                ..SchedulerConfig::default()
            }),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(t0())),
            strategy.clone(),
        );

        engine.process_visit("u1", tech_visit(t0())).await;
        let report = engine.task_runner().run_task(ScheduledTask::RetrainCheck).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(strategy.count(), 1);
        assert_eq!(engine.profile("u1").await.unwrap().interactions_since_retrain, 1);

        // the failed batch is offered again on the next check
        let report = engine.task_runner().run_task(ScheduledTask::RetrainCheck).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(strategy.count(), 2);
        engine.shutdown().await.unwrap();
    }
}

#[cfg(test)]
mod timer_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_persist_timer_fires_after_one_period() {
        let (engine, store, _) = memory_engine();
        engine.start_scheduler().await;
        engine.process_visit("u1", tech_visit(t0())).await;

        sleep(Duration::from_secs(299)).await;
        assert!(store.load_profile("u1").await.unwrap().is_none());

        sleep(Duration::from_secs(2)).await;
        let stored = store.load_profile("u1").await.unwrap().expect("persisted by the timer");
        assert_eq!(stored.visit_count, 1);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrain_timer_uses_check_interval() {
        let strategy = Arc::new(RecordingStrategy::default());
        let engine = engine_with(
            config_with(SchedulerConfig {
                retrain_every_interactions: 1,
                retrain_check_interval_secs: 30,
                ..SchedulerConfig::default()
            }),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(t0())),
            strategy.clone(),
        );
        engine.start_scheduler().await;
        engine.process_visit("u1", tech_visit(t0())).await;

        sleep(Duration::from_secs(29)).await;
        assert_eq!(strategy.count(), 0);
        sleep(Duration::from_secs(2)).await;
        assert_eq!(strategy.count(), 1);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timers() {
        let (engine, _, _) = memory_engine();
        let mut scheduler =
            LearningScheduler::spawn(engine.task_runner().clone(), &SchedulerConfig::default());
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_without_waiting_for_timer() {
        let (engine, store, _) = memory_engine();
        engine.start_scheduler().await;
        engine.process_visit("u1", tech_visit(t0())).await;

        engine.shutdown().await.unwrap();
        let stored = store.load_profile("u1").await.unwrap().expect("final persist");
        assert_eq!(stored.visit_count, 1);
    }
}
