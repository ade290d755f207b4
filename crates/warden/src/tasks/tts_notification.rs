//! Spoken notification task
//!
//! Announces events by spawning a configured external speech command with
//! the message substituted for `{message}` in its arguments. The speech
//! engine itself is a collaborator; a missing binary, non-zero exit, or
//! timeout stays silent.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use warden_core::config::task_config;
use warden_core::{Result, TaskResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TtsConfig {
    /// Speech program to spawn; the task is inert without one
    command: Option<String>,
    /// Arguments, with `{message}` replaced by the announcement
    args: Vec<String>,
}

pub struct TtsNotificationTask;

#[async_trait]
impl Task for TtsNotificationTask {
    fn name(&self) -> &'static str {
        "tts_notification"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let config: TtsConfig = task_config(ctx.config)?;
        let Some(program) = config.command else {
            return Ok(None);
        };

        let message = announcement(ctx);
        let args: Vec<String> = config
            .args
            .iter()
            .map(|arg| arg.replace("{message}", &message))
            .collect();

        let spawn = Command::new(&program)
            .args(&args)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();

        match tokio::time::timeout(ctx.global.subprocess_timeout(), spawn).await {
            Ok(Ok(status)) if status.success() => {}
            Ok(Ok(status)) => {
                tracing::debug!("tts command {program} exited with {status}");
            }
            Ok(Err(e)) => {
                tracing::debug!("tts command {program} failed to spawn: {e}");
            }
            Err(_) => {
                tracing::debug!(
                    "tts command {program} timed out after {}s",
                    ctx.global.subprocess_timeout
                );
            }
        }

        Ok(None)
    }
}

fn announcement(ctx: &TaskContext<'_>) -> String {
    let agent = ctx.global.agent_name.as_deref().unwrap_or("Your agent");
    match &ctx.event.message {
        Some(message) if !message.is_empty() => format!("{agent}: {message}"),
        _ => format!("{agent} needs your attention"),
    }
}
