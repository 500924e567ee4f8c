use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::actors::profile::ProfileActorHandle;
use crate::brain::ContentAnalysis;
use crate::database::{ClearReport, ClearScope};
use crate::learning::RetrainBatch;
use crate::models::{InteractionEvent, VisitContext};
use crate::mood::MoodSample;
use crate::predict::EngagementPrediction;
use crate::profile::{ReanalysisSummary, UserProfile};

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone)]
pub enum ActorError {
    /// The actor's mailbox is closed; it has stopped or is stopping.
    #[error("Actor mailbox closed: {0}")]
    Closed(String),
    /// The actor dropped the request without answering.
    #[error("Actor dropped the request: {0}")]
    NoResponse(String),
    /// A generic internal error within an actor.
    #[error("Internal system error: {0}")]
    Internal(String),
    /// An error indicating that an actor operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ActorError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ActorError::Timeout(format!("Actor operation timed out: {}", err))
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to a `ProfileActor`. Each one is handled to
/// completion before the next is taken from the mailbox.
#[derive(Debug)]
pub enum ProfileMessage {
    /// Relevance of the content to the live profile, read before prediction.
    Relevance {
        analysis: Arc<ContentAnalysis>,
        responder: oneshot::Sender<f64>,
    },
    /// Fold an analyzed visit into the profile and append it to the visit log.
    /// Either both happen or neither does.
    ApplyVisit {
        analysis: Arc<ContentAnalysis>,
        engagement: EngagementPrediction,
        context: VisitContext,
        responder: oneshot::Sender<Result<(), AppError>>,
    },
    /// Append telemetry events to the interaction window.
    RecordInteractions {
        events: Vec<InteractionEvent>,
        responder: oneshot::Sender<Result<usize, AppError>>,
    },
    /// Infer the current mood and append it to the history.
    InferMood {
        responder: oneshot::Sender<Result<MoodSample, AppError>>,
    },
    /// A copy of the current profile.
    Snapshot {
        responder: oneshot::Sender<UserProfile>,
    },
    Reanalyze {
        responder: oneshot::Sender<Result<ReanalysisSummary, AppError>>,
    },
    /// Save the profile if it changed since the last save. Answers whether it saved.
    Persist {
        responder: oneshot::Sender<Result<bool, AppError>>,
    },
    /// Hand out a retraining batch once `threshold` interactions have accumulated.
    /// The counter is left untouched until the batch is acknowledged.
    CheckRetrain {
        threshold: u64,
        responder: oneshot::Sender<Option<RetrainBatch>>,
    },
    /// A batch of `interactions` was retrained; take them off the counter.
    AckRetrain {
        interactions: u64,
        responder: oneshot::Sender<()>,
    },
    Clear {
        scope: ClearScope,
        responder: oneshot::Sender<Result<ClearReport, AppError>>,
    },
    /// Final persist, then stop. Everything queued before it is handled first.
    Shutdown {
        responder: oneshot::Sender<Result<(), AppError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// The actor for a user, loading the stored profile and spawning it on first use.
    GetProfile {
        user_id: String,
        responder: oneshot::Sender<Result<ProfileActorHandle, AppError>>,
    },
    /// Handles of every live profile actor, for the scheduler's fan-out.
    ListProfiles {
        responder: oneshot::Sender<Vec<ProfileActorHandle>>,
    },
    /// Shut down every profile actor (drain and final persist), then the supervisor.
    Shutdown {
        responder: oneshot::Sender<Result<(), AppError>>,
    },
}
