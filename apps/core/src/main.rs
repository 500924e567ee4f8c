// Attune host
// Reads JSON-lines commands on stdin, answers one JSON line per command on stdout.
//
//   {"command":"visit","user_id":"u1","visit":{"url":"...","timestamp":"..."}}
//   {"command":"interactions","user_id":"u1","events":[{"kind":"click","timestamp":"..."}]}
//   {"command":"mood","user_id":"u1"}
//   {"command":"profile","user_id":"u1"}
//   {"command":"clear","user_id":"u1","older_than_days":30}

use anyhow::Context;
use attune_core::clock::SystemClock;
use attune_core::config::EngineConfig;
use attune_core::database::ClearScope;
use attune_core::learning::LoggingRetrainStrategy;
use attune_core::models::{InteractionEvent, PageVisit};
use attune_core::telemetry::{init_tracing, LogFormat};
use attune_core::{AppError, Engine};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum Command {
    Visit {
        user_id: String,
        visit: PageVisit,
    },
    Interactions {
        user_id: String,
        events: Vec<InteractionEvent>,
    },
    Mood {
        user_id: String,
    },
    Profile {
        user_id: String,
    },
    Clear {
        user_id: String,
        /// Absent clears everything, including the profile.
        #[serde(default)]
        older_than_days: Option<i64>,
    },
}

async fn execute(engine: &Engine, command: Command) -> Result<Value, AppError> {
    let value = match command {
        Command::Visit { user_id, visit } => {
            serde_json::to_value(engine.process_visit(&user_id, visit).await)?
        }
        Command::Interactions { user_id, events } => {
            let accepted = engine.record_interactions(&user_id, events).await?;
            json!({ "accepted": accepted })
        }
        Command::Mood { user_id } => serde_json::to_value(engine.current_mood(&user_id).await)?,
        Command::Profile { user_id } => {
            serde_json::to_value(engine.personalized_content(&user_id).await?)?
        }
        Command::Clear {
            user_id,
            older_than_days,
        } => {
            let scope = match older_than_days {
                None => ClearScope::All,
                Some(days) => ClearScope::OlderThan(chrono::Duration::try_days(days).ok_or_else(
                    || AppError::Validation(format!("Retention of {} days is out of range", days)),
                )?),
            };
            serde_json::to_value(engine.clear_data(&user_id, scope).await?)?
        }
    };
    Ok(value)
}

async fn handle_line(engine: &Engine, line: &str) -> Value {
    let command: Command = match serde_json::from_str(line) {
        Ok(command) => command,
        Err(e) => {
            warn!("Rejected command: {}", e);
            return json!({ "ok": false, "error": format!("Invalid command: {}", e) });
        }
    };
    match execute(engine, command).await {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(e) => {
            error!("Command failed: {}", e);
            json!({ "ok": false, "error": e.to_string() })
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("attune", LogFormat::from_env()).map_err(anyhow::Error::msg)?;

    let config = EngineConfig::from_env().context("Failed to load configuration")?;
    let engine = Engine::open(
        config,
        Arc::new(SystemClock),
        Arc::new(LoggingRetrainStrategy),
    )
    .await
    .context("Failed to start engine")?;
    engine.start_scheduler().await;
    info!("Attune ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&engine, &line).await;
        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    engine.shutdown().await.context("Engine shutdown failed")?;
    Ok(())
}
