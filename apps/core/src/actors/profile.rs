use crate::actors::messages::{ActorError, AppError, ProfileMessage};
use crate::actors::traits::ProfileActor;
use crate::brain::ContentAnalysis;
use crate::clock::Clock;
use crate::config::MoodConfig;
use crate::database::{ClearReport, ClearScope, ProfileStore};
use crate::learning::RetrainBatch;
use crate::models::{InteractionEvent, VisitContext, VisitRecord};
use crate::mood::{InteractionWindow, MoodClassifier, MoodSample};
use crate::predict::EngagementPrediction;
use crate::profile::{InterestTracker, ReanalysisSummary, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Everything a profile actor needs besides its profile.
#[derive(Clone)]
pub struct ProfileActorDeps {
    pub store: Arc<dyn ProfileStore>,
    pub clock: Arc<dyn Clock>,
    pub tracker: Arc<InterestTracker>,
    pub mood: MoodConfig,
    /// Look-back window for re-analysis
    pub recent_window: chrono::Duration,
    pub mailbox_capacity: usize,
    pub request_timeout: Duration,
}

/// A handle to the actor that owns one user's profile.
#[derive(Clone, Debug)]
pub struct ProfileActorHandle {
    user_id: Arc<str>,
    sender: mpsc::Sender<ProfileMessage>,
    request_timeout: Duration,
}

impl ProfileActorHandle {
    /// Spawns the actor owning `profile` and returns a handle to it.
    pub fn spawn(profile: UserProfile, deps: ProfileActorDeps) -> Self {
        let (sender, receiver) = mpsc::channel(deps.mailbox_capacity);
        let user_id: Arc<str> = Arc::from(profile.user_id.as_str());
        let request_timeout = deps.request_timeout;
        let runner = ProfileRunner::new(receiver, profile, deps);
        tokio::spawn(async move { runner.run().await });
        Self {
            user_id,
            sender,
            request_timeout,
        }
    }

    /// True once the actor has stopped accepting messages.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn post<T, F>(&self, make: F) -> Result<oneshot::Receiver<T>, AppError>
    where
        T: Send,
        F: FnOnce(oneshot::Sender<T>) -> ProfileMessage + Send,
    {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(make(send))
            .await
            .map_err(|e| ActorError::Closed(e.to_string()))?;
        Ok(recv)
    }

    async fn request<T, F>(&self, make: F) -> Result<T, AppError>
    where
        T: Send,
        F: FnOnce(oneshot::Sender<T>) -> ProfileMessage + Send,
    {
        let recv = self.post(make).await?;
        timeout(self.request_timeout, recv)
            .await?
            .map_err(|e| AppError::from(ActorError::NoResponse(e.to_string())))
    }

    /// For mutations whose outcome the caller must know: once accepted, the
    /// message runs, so the answer is awaited without a timeout.
    async fn request_to_completion<T, F>(&self, make: F) -> Result<T, AppError>
    where
        T: Send,
        F: FnOnce(oneshot::Sender<T>) -> ProfileMessage + Send,
    {
        self.post(make)
            .await?
            .await
            .map_err(|e| AppError::from(ActorError::NoResponse(e.to_string())))
    }
}

#[async_trait]
impl ProfileActor for ProfileActorHandle {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn relevance(&self, analysis: Arc<ContentAnalysis>) -> Result<f64, AppError> {
        self.request(|responder| ProfileMessage::Relevance {
            analysis,
            responder,
        })
        .await
    }

    #[instrument(skip_all, fields(user_id = %self.user_id))]
    async fn apply_visit(
        &self,
        analysis: Arc<ContentAnalysis>,
        engagement: EngagementPrediction,
        context: VisitContext,
    ) -> Result<(), AppError> {
        self.request_to_completion(|responder| ProfileMessage::ApplyVisit {
            analysis,
            engagement,
            context,
            responder,
        })
        .await?
    }

    #[instrument(skip_all, fields(user_id = %self.user_id, count = events.len()))]
    async fn record_interactions(&self, events: Vec<InteractionEvent>) -> Result<usize, AppError> {
        self.request(|responder| ProfileMessage::RecordInteractions { events, responder })
            .await?
    }

    #[instrument(skip_all, fields(user_id = %self.user_id))]
    async fn infer_mood(&self) -> Result<MoodSample, AppError> {
        self.request(|responder| ProfileMessage::InferMood { responder })
            .await?
    }

    async fn snapshot(&self) -> Result<UserProfile, AppError> {
        self.request(|responder| ProfileMessage::Snapshot { responder })
            .await
    }

    async fn reanalyze(&self) -> Result<ReanalysisSummary, AppError> {
        self.request(|responder| ProfileMessage::Reanalyze { responder })
            .await?
    }

    async fn persist(&self) -> Result<bool, AppError> {
        self.request(|responder| ProfileMessage::Persist { responder })
            .await?
    }

    async fn check_retrain(&self, threshold: u64) -> Result<Option<RetrainBatch>, AppError> {
        self.request(|responder| ProfileMessage::CheckRetrain {
            threshold,
            responder,
        })
        .await
    }

    async fn ack_retrain(&self, interactions: u64) -> Result<(), AppError> {
        self.request(|responder| ProfileMessage::AckRetrain {
            interactions,
            responder,
        })
        .await
    }

    #[instrument(skip(self), fields(user_id = %self.user_id))]
    async fn clear(&self, scope: ClearScope) -> Result<ClearReport, AppError> {
        self.request(|responder| ProfileMessage::Clear { scope, responder })
            .await?
    }

    /// Not bounded by the request timeout: the actor first drains its mailbox.
    async fn shutdown(&self) -> Result<(), AppError> {
        self.request_to_completion(|responder| ProfileMessage::Shutdown { responder })
            .await?
    }
}

// --- Actor Runner ---
struct ProfileRunner {
    receiver: mpsc::Receiver<ProfileMessage>,
    deps: ProfileActorDeps,
    classifier: MoodClassifier,
    profile: UserProfile,
    window: InteractionWindow,
    /// Changed since the last successful save
    dirty: bool,
    shutdown_waiters: Vec<oneshot::Sender<Result<(), AppError>>>,
}

impl ProfileRunner {
    fn new(
        receiver: mpsc::Receiver<ProfileMessage>,
        profile: UserProfile,
        deps: ProfileActorDeps,
    ) -> Self {
        Self {
            receiver,
            classifier: MoodClassifier::new(&deps.mood),
            window: InteractionWindow::from_config(&deps.mood),
            deps,
            profile,
            dirty: false,
            shutdown_waiters: Vec::new(),
        }
    }

    async fn run(mut self) {
        info!(user_id = %self.profile.user_id, "Profile actor started");
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg).await;
        }

        // Mailbox drained: either a shutdown was requested or every handle is gone
        let result = self.persist().await.map(|_| ());
        if let Err(e) = &result {
            error!(user_id = %self.profile.user_id, "Final persist failed: {}", e);
        }
        for waiter in self.shutdown_waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
        info!(user_id = %self.profile.user_id, "Profile actor stopped");
    }

    async fn handle_message(&mut self, msg: ProfileMessage) {
        match msg {
            ProfileMessage::Relevance {
                analysis,
                responder,
            } => {
                let _ = responder.send(self.profile.relevance_to(&analysis));
            }
            ProfileMessage::ApplyVisit {
                analysis,
                engagement,
                context,
                responder,
            } => {
                if responder.is_closed() {
                    debug!(
                        user_id = %self.profile.user_id,
                        url = %context.url,
                        "Caller gone, visit not applied"
                    );
                    return;
                }
                let result = self.apply_visit(&analysis, &engagement, &context).await;
                if let Err(e) = &result {
                    warn!(
                        user_id = %self.profile.user_id,
                        url = %context.url,
                        "Visit skipped, profile update dropped: {}",
                        e
                    );
                }
                let _ = responder.send(result);
            }
            ProfileMessage::RecordInteractions { events, responder } => {
                let _ = responder.send(Ok(self.record_interactions(events)));
            }
            ProfileMessage::InferMood { responder } => {
                let _ = responder.send(Ok(self.infer_mood()));
            }
            ProfileMessage::Snapshot { responder } => {
                let _ = responder.send(self.profile.clone());
            }
            ProfileMessage::Reanalyze { responder } => {
                let result = self.reanalyze().await;
                if let Err(e) = &result {
                    warn!(user_id = %self.profile.user_id, "Re-analysis failed: {}", e);
                }
                let _ = responder.send(result);
            }
            ProfileMessage::Persist { responder } => {
                let result = self.persist().await;
                if let Err(e) = &result {
                    error!(user_id = %self.profile.user_id, "Persist failed: {}", e);
                }
                let _ = responder.send(result);
            }
            ProfileMessage::CheckRetrain {
                threshold,
                responder,
            } => {
                let _ = responder.send(self.check_retrain(threshold));
            }
            ProfileMessage::AckRetrain {
                interactions,
                responder,
            } => {
                self.ack_retrain(interactions);
                let _ = responder.send(());
            }
            ProfileMessage::Clear { scope, responder } => {
                let _ = responder.send(self.clear(scope).await);
            }
            ProfileMessage::Shutdown { responder } => {
                // Stop accepting new messages; whatever is already queued still runs
                self.receiver.close();
                self.shutdown_waiters.push(responder);
            }
        }
    }

    async fn apply_visit(
        &mut self,
        analysis: &ContentAnalysis,
        engagement: &EngagementPrediction,
        context: &VisitContext,
    ) -> Result<(), AppError> {
        let mut updated =
            self.deps
                .tracker
                .apply(&self.profile, analysis, engagement, context)?;

        let record = VisitRecord {
            id: Uuid::new_v4().to_string(),
            user_id: self.profile.user_id.clone(),
            url: context.url.clone(),
            title: context.title.clone(),
            category: analysis.category.primary.clone(),
            engagement: engagement.score,
            timestamp: context.timestamp,
        };
        self.deps.store.record_visit(&record).await?;

        updated.interaction_count += 1;
        updated.interactions_since_retrain += 1;
        self.profile = updated;
        self.dirty = true;
        debug!(user_id = %self.profile.user_id, visits = self.profile.visit_count, "Visit applied");
        Ok(())
    }

    fn record_interactions(&mut self, events: Vec<InteractionEvent>) -> usize {
        let count = events.len();
        for event in events {
            self.window.push(event);
        }
        self.window.prune(self.deps.clock.now());

        self.profile.interaction_count += count as u64;
        self.profile.interactions_since_retrain += count as u64;
        self.dirty |= count > 0;
        count
    }

    fn infer_mood(&mut self) -> MoodSample {
        let now = self.deps.clock.now();
        self.window.prune(now);
        let sample = self.classifier.infer(&self.window.snapshot(), now);
        self.profile
            .push_mood(sample.clone(), self.deps.mood.history_cap);
        self.dirty = true;
        sample
    }

    async fn reanalyze(&mut self) -> Result<ReanalysisSummary, AppError> {
        let now = self.deps.clock.now();
        let window = self.deps.recent_window;
        let recent = self
            .deps
            .store
            .visits_between(&self.profile.user_id, now - window, now)
            .await?;
        let before = self.profile.clone();
        let summary = self
            .deps
            .tracker
            .reanalyze(&mut self.profile, &recent, now, window);
        self.dirty |= self.profile != before;
        Ok(summary)
    }

    async fn persist(&mut self) -> Result<bool, AppError> {
        if !self.dirty {
            return Ok(false);
        }
        self.deps.store.save_profile(&self.profile).await?;
        self.dirty = false;
        Ok(true)
    }

    fn check_retrain(&mut self, threshold: u64) -> Option<RetrainBatch> {
        if self.profile.interactions_since_retrain < threshold {
            return None;
        }
        let batch = RetrainBatch {
            user_id: self.profile.user_id.clone(),
            interactions: self.profile.interactions_since_retrain,
            triggered_at: self.deps.clock.now(),
            profile: self.profile.clone(),
        };
        Some(batch)
    }

    // Interactions that arrived after the batch was cut stay counted
    fn ack_retrain(&mut self, interactions: u64) {
        let counter = &mut self.profile.interactions_since_retrain;
        *counter = counter.saturating_sub(interactions);
        self.dirty = true;
    }

    async fn clear(&mut self, scope: ClearScope) -> Result<ClearReport, AppError> {
        let now = self.deps.clock.now();
        let mut report = self
            .deps
            .store
            .clear(&self.profile.user_id, scope, now)
            .await?;

        match scope.cutoff(now) {
            None => {
                let user_id = self.profile.user_id.clone();
                self.profile = UserProfile::new(&user_id, now);
                self.window = InteractionWindow::from_config(&self.deps.mood);
                self.dirty = false;
            }
            Some(cutoff) => {
                let forgotten = self.profile.forget_before(cutoff);
                report.mood_samples_removed = report
                    .mood_samples_removed
                    .max(forgotten.mood_samples as u64);
                report.patterns_removed += forgotten.patterns as u64;
                report.evolution_entries_removed += forgotten.evolution_entries as u64;
                self.dirty = true;
                self.persist().await?;
            }
        }

        info!(user_id = %self.profile.user_id, ?report, "Privacy clear completed");
        Ok(report)
    }
}
