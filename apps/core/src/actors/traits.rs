use crate::actors::messages::AppError;
use crate::brain::ContentAnalysis;
use crate::database::{ClearReport, ClearScope};
use crate::learning::RetrainBatch;
use crate::models::{InteractionEvent, VisitContext};
use crate::mood::MoodSample;
use crate::predict::EngagementPrediction;
use crate::profile::{ReanalysisSummary, UserProfile};
use async_trait::async_trait;
use std::sync::Arc;

/// Defines the public interface of the actor that owns one user's profile.
///
/// Every mutation of a profile goes through this interface, so all of them
/// are serialized by the actor's mailbox.
#[async_trait]
pub trait ProfileActor: Send + Sync + 'static {
    fn user_id(&self) -> &str;

    /// Relevance of the content to the current profile, in `[0, 1]`.
    async fn relevance(&self, analysis: Arc<ContentAnalysis>) -> Result<f64, AppError>;

    /// Folds an analyzed visit into the profile.
    async fn apply_visit(
        &self,
        analysis: Arc<ContentAnalysis>,
        engagement: EngagementPrediction,
        context: VisitContext,
    ) -> Result<(), AppError>;

    async fn record_interactions(&self, events: Vec<InteractionEvent>) -> Result<usize, AppError>;

    async fn infer_mood(&self) -> Result<MoodSample, AppError>;

    async fn snapshot(&self) -> Result<UserProfile, AppError>;

    async fn reanalyze(&self) -> Result<ReanalysisSummary, AppError>;

    /// Saves the profile if it changed. Returns whether a save happened.
    async fn persist(&self) -> Result<bool, AppError>;

    async fn check_retrain(&self, threshold: u64) -> Result<Option<RetrainBatch>, AppError>;

    /// Confirms that a batch from `check_retrain` was retrained.
    async fn ack_retrain(&self, interactions: u64) -> Result<(), AppError>;

    async fn clear(&self, scope: ClearScope) -> Result<ClearReport, AppError>;

    /// Drains the mailbox, persists and stops the actor.
    async fn shutdown(&self) -> Result<(), AppError>;
}
