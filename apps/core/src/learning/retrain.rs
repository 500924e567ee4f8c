use crate::error::AppError;
use crate::profile::UserProfile;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Work handed to a [`RetrainStrategy`] once a profile accumulated enough
/// interactions since its last trigger.
#[derive(Debug, Clone)]
pub struct RetrainBatch {
    pub user_id: String,
    /// Interactions counted since the previous trigger.
    pub interactions: u64,
    pub triggered_at: DateTime<Utc>,
    /// Profile as it was when the trigger fired.
    pub profile: UserProfile,
}

/// Pluggable retraining hook.
#[async_trait]
pub trait RetrainStrategy: Send + Sync {
    async fn retrain(&self, batch: RetrainBatch) -> Result<(), AppError>;
}

/// Default strategy. Records that retraining would run and does nothing else.
#[derive(Debug, Default, Clone)]
pub struct LoggingRetrainStrategy;

#[async_trait]
impl RetrainStrategy for LoggingRetrainStrategy {
    async fn retrain(&self, batch: RetrainBatch) -> Result<(), AppError> {
        let top: Vec<&str> = batch
            .profile
            .top_interests(3)
            .into_iter()
            .map(|interest| interest.topic.as_str())
            .collect();
        info!(
            user_id = %batch.user_id,
            interactions = batch.interactions,
            triggered_at = %batch.triggered_at,
            top_interests = ?top,
            "Retraining triggered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_strategy_accepts_batch() {
        let now = Utc::now();
        let batch = RetrainBatch {
            user_id: "u1".to_string(),
            interactions: 100,
            triggered_at: now,
            profile: UserProfile::new("u1", now),
        };
        assert!(LoggingRetrainStrategy.retrain(batch).await.is_ok());
    }
}
