//! Continuous learning scheduler
//!
//! Three independent periodic tasks fan out over every live profile actor:
//!
//! - persistence saves profiles that changed since their last save
//! - re-analysis refreshes pattern strengths and the recent focus
//! - the retraining check hands a batch to the [`RetrainStrategy`] once a
//!   profile accumulated enough interactions
//!
//! Tasks only enqueue messages, so they run between actor messages and never
//! interrupt a mutation or block the visit path. All of them stop on a single
//! shutdown broadcast.

use crate::actors::{ProfileActor, ProfileActorHandle, SupervisorHandle};
use crate::config::SchedulerConfig;
use crate::error::AppError;
use crate::learning::retrain::RetrainStrategy;
use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledTask {
    Persist,
    Reanalyze,
    RetrainCheck,
}

impl ScheduledTask {
    pub const ALL: [ScheduledTask; 3] = [
        ScheduledTask::Persist,
        ScheduledTask::Reanalyze,
        ScheduledTask::RetrainCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduledTask::Persist => "persist",
            ScheduledTask::Reanalyze => "reanalyze",
            ScheduledTask::RetrainCheck => "retrain_check",
        }
    }

    /// Period of this task under `config`.
    pub fn period(&self, config: &SchedulerConfig) -> Duration {
        match self {
            ScheduledTask::Persist => config.persist_interval(),
            ScheduledTask::Reanalyze => config.reanalyze_interval(),
            ScheduledTask::RetrainCheck => config.retrain_check_interval(),
        }
    }
}

impl fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one run of a task across all profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task: ScheduledTask,
    /// Profiles the task was sent to.
    pub profiles: usize,
    /// Profiles the task changed: saved, re-analyzed or handed to retraining.
    pub affected: usize,
    pub failed: usize,
}

/// Runs one scheduled task against every live profile actor.
///
/// The scheduler calls [`TaskRunner::run_task`] on its timers; tests call it
/// directly to drive a task without waiting.
#[derive(Clone)]
pub struct TaskRunner {
    supervisor: SupervisorHandle,
    strategy: Arc<dyn RetrainStrategy>,
    retrain_every: u64,
}

impl TaskRunner {
    pub fn new(
        supervisor: SupervisorHandle,
        strategy: Arc<dyn RetrainStrategy>,
        retrain_every: u64,
    ) -> Self {
        Self {
            supervisor,
            strategy,
            retrain_every,
        }
    }

    pub async fn run_task(&self, task: ScheduledTask) -> Result<TaskReport, AppError> {
        let handles = self.supervisor.profiles().await?;
        let outcomes = join_all(handles.iter().map(|h| self.run_on(task, h))).await;

        let mut report = TaskReport {
            task,
            profiles: handles.len(),
            affected: 0,
            failed: 0,
        };
        for (handle, outcome) in handles.iter().zip(outcomes) {
            match outcome {
                Ok(true) => report.affected += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%task, user_id = handle.user_id(), "Scheduled task failed: {}", e);
                    report.failed += 1;
                }
            }
        }
        debug!(?report, "Scheduled task finished");
        Ok(report)
    }

    async fn run_on(&self, task: ScheduledTask, handle: &ProfileActorHandle) -> Result<bool, AppError> {
        match task {
            ScheduledTask::Persist => handle.persist().await,
            ScheduledTask::Reanalyze => handle.reanalyze().await.map(|_| true),
            ScheduledTask::RetrainCheck => match handle.check_retrain(self.retrain_every).await? {
                Some(batch) => {
                    let interactions = batch.interactions;
                    self.strategy.retrain(batch).await?;
                    handle.ack_retrain(interactions).await?;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }
}

/// Handle to the running scheduler timers.
pub struct LearningScheduler {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl LearningScheduler {
    /// Starts one timer per [`ScheduledTask`]. The first run of each task
    /// happens one full period after the start.
    pub fn spawn(runner: TaskRunner, config: &SchedulerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let tasks = ScheduledTask::ALL
            .iter()
            .map(|&task| {
                let period = task.period(config);
                let runner = runner.clone();
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(run_loop(runner, task, period, shutdown_rx))
            })
            .collect();

        info!(
            persist_secs = config.persist_interval_secs,
            reanalyze_secs = config.reanalyze_interval_secs,
            retrain_check_secs = config.retrain_check_interval_secs,
            "Learning scheduler started"
        );
        Self { shutdown_tx, tasks }
    }

    /// Signals every timer to stop and waits for them. A task already running
    /// completes first.
    pub async fn stop(&mut self) -> Result<(), AppError> {
        let _ = self.shutdown_tx.send(());

        for handle in self.tasks.drain(..) {
            handle
                .await
                .map_err(|e| AppError::Internal(format!("Failed to stop scheduler task: {}", e)))?;
        }

        info!("Learning scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|h| !h.is_finished())
    }
}

async fn run_loop(
    runner: TaskRunner,
    task: ScheduledTask,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                if let Err(e) = runner.run_task(task).await {
                    error!(%task, "Scheduled task could not run: {}", e);
                }
            }
            _ = shutdown_rx.recv() => {
                debug!(%task, "Scheduler task received shutdown signal");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_periods_follow_config() {
        let config = SchedulerConfig {
            persist_interval_secs: 300,
            reanalyze_interval_secs: 60,
            retrain_check_interval_secs: 30,
            ..SchedulerConfig::default()
        };
        assert_eq!(ScheduledTask::Persist.period(&config), Duration::from_secs(300));
        assert_eq!(ScheduledTask::Reanalyze.period(&config), Duration::from_secs(60));
        assert_eq!(ScheduledTask::RetrainCheck.period(&config), Duration::from_secs(30));
        assert_eq!(ScheduledTask::RetrainCheck.to_string(), "retrain_check");
    }
}
