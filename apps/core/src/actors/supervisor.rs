use crate::actors::messages::{ActorError, AppError, SupervisorMessage};
use crate::actors::profile::{ProfileActorDeps, ProfileActorHandle};
use crate::actors::traits::ProfileActor;
use crate::profile::UserProfile;
use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{error, info, instrument};

/// A handle to the `SupervisorActor`.
///
/// The supervisor owns the registry of profile actors. It is the only place
/// that spawns them, so each user has at most one live actor.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    deps: ProfileActorDeps,
}

impl SupervisorHandle {
    /// Spawns the supervisor. Profile actors it creates share `deps`.
    pub fn new(deps: ProfileActorDeps) -> Self {
        let (sender, receiver) = mpsc::channel(deps.mailbox_capacity);
        let runner = SupervisorRunner::new(receiver, deps.clone());
        tokio::spawn(async move { runner.run().await });
        Self { sender, deps }
    }

    /// The actor owning `user_id`'s profile, spawning it on first use.
    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: &str) -> Result<ProfileActorHandle, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::GetProfile {
            user_id: user_id.to_string(),
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Closed(e.to_string()))?;
        timeout(self.deps.request_timeout, recv)
            .await?
            .map_err(|e| AppError::from(ActorError::NoResponse(e.to_string())))?
    }

    /// Handles of all live profile actors.
    pub async fn profiles(&self) -> Result<Vec<ProfileActorHandle>, AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(SupervisorMessage::ListProfiles { responder: send })
            .await
            .map_err(|e| ActorError::Closed(e.to_string()))?;
        timeout(self.deps.request_timeout, recv)
            .await?
            .map_err(|e| AppError::from(ActorError::NoResponse(e.to_string())))
    }

    /// Drains and persists every profile actor, then stops the supervisor.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let (send, recv) = oneshot::channel();
        self.sender
            .send(SupervisorMessage::Shutdown { responder: send })
            .await
            .map_err(|e| ActorError::Closed(e.to_string()))?;
        recv.await
            .map_err(|e| AppError::from(ActorError::NoResponse(e.to_string())))?
    }
}

// --- Actor Runner ---
struct SupervisorRunner {
    receiver: mpsc::Receiver<SupervisorMessage>,
    deps: ProfileActorDeps,
    registry: HashMap<String, ProfileActorHandle>,
    stopping: bool,
}

impl SupervisorRunner {
    fn new(receiver: mpsc::Receiver<SupervisorMessage>, deps: ProfileActorDeps) -> Self {
        Self {
            receiver,
            deps,
            registry: HashMap::new(),
            stopping: false,
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            if let Err(e) = self.handle_message(msg).await {
                error!("Error handling message: {:?}", e);
            }
        }
        info!("Supervisor stopped");
    }

    #[instrument(skip(self, msg), fields(message_type = %std::any::type_name::<SupervisorMessage>()))]
    async fn handle_message(&mut self, msg: SupervisorMessage) -> Result<(), AppError> {
        match msg {
            SupervisorMessage::GetProfile { user_id, responder } => {
                if self.stopping {
                    let _ = responder.send(Err(ActorError::Closed(
                        "Supervisor is shutting down".to_string(),
                    )
                    .into()));
                    return Ok(());
                }
                let result = self.get_or_spawn(&user_id).await;
                if let Err(e) = &result {
                    error!(%user_id, "Could not start profile actor: {:?}", e);
                }
                let _ = responder.send(result);
            }
            SupervisorMessage::ListProfiles { responder } => {
                self.registry.retain(|_, handle| !handle.is_closed());
                let mut handles: Vec<(String, ProfileActorHandle)> = self
                    .registry
                    .iter()
                    .map(|(id, h)| (id.clone(), h.clone()))
                    .collect();
                handles.sort_by(|a, b| a.0.cmp(&b.0));
                let _ = responder.send(handles.into_iter().map(|(_, h)| h).collect());
            }
            SupervisorMessage::Shutdown { responder } => {
                self.stopping = true;
                self.receiver.close();
                let result = self.shutdown_profiles().await;
                let _ = responder.send(result);
            }
        }
        Ok(())
    }

    async fn get_or_spawn(&mut self, user_id: &str) -> Result<ProfileActorHandle, AppError> {
        if let Some(handle) = self.registry.get(user_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        let profile = match self.deps.store.load_profile(user_id).await? {
            Some(profile) => {
                info!(user_id, visits = profile.visit_count, "Loaded stored profile");
                profile
            }
            None => {
                info!(user_id, "Creating new profile");
                UserProfile::new(user_id, self.deps.clock.now())
            }
        };

        let handle = ProfileActorHandle::spawn(profile, self.deps.clone());
        self.registry.insert(user_id.to_string(), handle.clone());
        Ok(handle)
    }

    async fn shutdown_profiles(&mut self) -> Result<(), AppError> {
        let handles: Vec<ProfileActorHandle> = self
            .registry
            .drain()
            .map(|(_, h)| h)
            .filter(|h| !h.is_closed())
            .collect();
        info!(count = handles.len(), "Shutting down profile actors");

        let results = join_all(handles.iter().map(|h| h.shutdown())).await;
        let mut first_error = None;
        for (handle, result) in handles.iter().zip(results) {
            if let Err(e) = result {
                error!(user_id = handle.user_id(), "Profile actor shutdown failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
