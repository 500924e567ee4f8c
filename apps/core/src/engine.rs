//! The personalization engine.
//!
//! Wires the pure stages (analysis, prediction) to the stateful ones (one
//! profile actor per user, the learning scheduler). Analysis and prediction
//! run on the caller's task; every profile mutation is a message to the
//! user's actor.

use crate::actors::{ProfileActor, ProfileActorDeps, SupervisorHandle};
use crate::brain::{ContentAnalysis, ContentAnalyzer};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::database::{init_db, ClearReport, ClearScope, MemoryStore, ProfileStore, SqliteStore};
use crate::error::AppError;
use crate::learning::{LearningScheduler, RetrainStrategy, TaskRunner};
use crate::models::{InteractionEvent, PageVisit, VisitContext};
use crate::mood::{MoodClassifier, MoodSample};
use crate::predict::{EmotionPredictor, EmotionProfile, EngagementPrediction, EngagementPredictor};
use crate::profile::{InterestTracker, UserProfile};
use crate::recommend::{PersonalizedContent, Recommender};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Everything produced for one page visit.
#[derive(Debug, Clone, Serialize)]
pub struct VisitOutcome {
    pub analysis: ContentAnalysis,
    pub engagement: EngagementPrediction,
    pub emotion: EmotionProfile,
    /// False when the profile update was dropped.
    pub profile_updated: bool,
    pub error: Option<String>,
}

pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn ProfileStore>,
    clock: Arc<dyn Clock>,
    analyzer: ContentAnalyzer,
    engagement: EngagementPredictor,
    emotions: EmotionPredictor,
    recommender: Recommender,
    fallback_mood: MoodClassifier,
    supervisor: SupervisorHandle,
    runner: TaskRunner,
    scheduler: Mutex<Option<LearningScheduler>>,
}

impl Engine {
    /// Builds an engine over `store`. Must be called inside a tokio runtime.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ProfileStore>,
        clock: Arc<dyn Clock>,
        retrain: Arc<dyn RetrainStrategy>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let deps = ProfileActorDeps {
            store: Arc::clone(&store),
            clock: Arc::clone(&clock),
            tracker: Arc::new(InterestTracker::new(config.tracker.clone())),
            mood: config.mood.clone(),
            recent_window: chrono::Duration::hours(config.scheduler.recent_window_hours),
            mailbox_capacity: config.mailbox_capacity,
            request_timeout: config.request_timeout(),
        };
        let supervisor = SupervisorHandle::new(deps);
        let runner = TaskRunner::new(
            supervisor.clone(),
            retrain,
            config.scheduler.retrain_every_interactions,
        );

        Ok(Self {
            fallback_mood: MoodClassifier::new(&config.mood),
            config,
            store,
            clock,
            analyzer: ContentAnalyzer::new(),
            engagement: EngagementPredictor::new(),
            emotions: EmotionPredictor::new(),
            recommender: Recommender::default(),
            supervisor,
            runner,
            scheduler: Mutex::new(None),
        })
    }

    /// Opens the store named by `config.database_url` (SQLite), or an
    /// in-memory store when none is set, and builds the engine over it.
    pub async fn open(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        retrain: Arc<dyn RetrainStrategy>,
    ) -> Result<Self, AppError> {
        let store: Arc<dyn ProfileStore> = match &config.database_url {
            Some(url) => {
                let pool = init_db(url).await?;
                Arc::new(SqliteStore::new(pool).with_mood_history_cap(config.mood.history_cap))
            }
            None => {
                info!("No database configured, profiles are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };
        Self::new(config, store, clock, retrain)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ProfileStore> {
        &self.store
    }

    /// Runs scheduled tasks on demand, outside the timers.
    pub fn task_runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Starts the periodic persistence, re-analysis and retraining timers.
    /// Does nothing if they are already running.
    pub async fn start_scheduler(&self) {
        let mut slot = self.scheduler.lock().await;
        if slot.as_ref().is_some_and(|s| s.is_running()) {
            return;
        }
        *slot = Some(LearningScheduler::spawn(
            self.runner.clone(),
            &self.config.scheduler,
        ));
    }

    /// Analyzes a visit and folds it into the user's profile.
    ///
    /// Never fails: when the profile cannot be updated the analysis and
    /// predictions are still returned, with `profile_updated` unset and the
    /// error described.
    #[instrument(skip(self, visit), fields(url = %visit.url))]
    pub async fn process_visit(&self, user_id: &str, visit: PageVisit) -> VisitOutcome {
        let analysis = Arc::new(self.analyzer.analyze_visit(&visit));
        let emotion = self.emotions.predict(&visit.text, &analysis.sentiment);
        let context = VisitContext::from(&visit);
        drop(visit);

        let actor = self.supervisor.profile(user_id).await;
        let relevance = match &actor {
            Ok(actor) => actor
                .relevance(Arc::clone(&analysis))
                .await
                .unwrap_or_else(|e| {
                    warn!(user_id, "Relevance unavailable, using 0: {}", e);
                    0.0
                }),
            Err(_) => 0.0,
        };
        let engagement =
            self.engagement
                .predict(&analysis, &context, relevance, self.clock.now());

        let applied = match actor {
            Ok(actor) => {
                actor
                    .apply_visit(Arc::clone(&analysis), engagement.clone(), context)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = &applied {
            warn!(user_id, "Profile not updated for visit: {}", e);
        }

        VisitOutcome {
            analysis: Arc::unwrap_or_clone(analysis),
            engagement,
            emotion,
            profile_updated: applied.is_ok(),
            error: applied.err().map(|e| e.to_string()),
        }
    }

    /// Appends telemetry events to the user's interaction window.
    pub async fn record_interactions(
        &self,
        user_id: &str,
        events: Vec<InteractionEvent>,
    ) -> Result<usize, AppError> {
        let actor = self.supervisor.profile(user_id).await?;
        actor.record_interactions(events).await
    }

    /// Infers the user's current mood. Answers `insufficient_data` with zero
    /// confidence when the profile actor cannot be reached.
    pub async fn current_mood(&self, user_id: &str) -> MoodSample {
        let result = match self.supervisor.profile(user_id).await {
            Ok(actor) => actor.infer_mood().await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| {
            warn!(user_id, "Mood inference unavailable: {}", e);
            self.fallback_mood.infer(&[], self.clock.now())
        })
    }

    pub async fn profile(&self, user_id: &str) -> Result<UserProfile, AppError> {
        let actor = self.supervisor.profile(user_id).await?;
        actor.snapshot().await
    }

    pub async fn personalized_content(
        &self,
        user_id: &str,
    ) -> Result<PersonalizedContent, AppError> {
        let profile = self.profile(user_id).await?;
        Ok(self.recommender.recommend(&profile, self.clock.now()))
    }

    /// Removes the user's data within `scope` from memory and from the store.
    #[instrument(skip(self))]
    pub async fn clear_data(
        &self,
        user_id: &str,
        scope: ClearScope,
    ) -> Result<ClearReport, AppError> {
        let actor = self.supervisor.profile(user_id).await?;
        actor.clear(scope).await
    }

    /// Stops the timers, then drains and persists every profile actor.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        if let Some(mut scheduler) = self.scheduler.lock().await.take() {
            scheduler.stop().await?;
        }
        self.supervisor.shutdown().await?;
        info!("Engine shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::learning::LoggingRetrainStrategy;
    use chrono::{TimeZone, Utc};

    fn engine() -> Engine {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap());
        Engine::new(
            EngineConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(clock),
            Arc::new(LoggingRetrainStrategy),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            mailbox_capacity: 0,
            ..EngineConfig::default()
        };
        let result = Engine::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(crate::clock::SystemClock),
            Arc::new(LoggingRetrainStrategy),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_mood_without_events_is_insufficient() {
        let engine = engine();
        let sample = engine.current_mood("u1").await;
        assert_eq!(sample.mood, crate::mood::MoodLabel::InsufficientData);
        assert_eq!(sample.confidence, 0.0);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_start_is_idempotent() {
        let engine = engine();
        engine.start_scheduler().await;
        engine.start_scheduler().await;
        assert!(engine.scheduler.lock().await.as_ref().unwrap().is_running());
        engine.shutdown().await.unwrap();
        assert!(engine.scheduler.lock().await.is_none());
    }
}
