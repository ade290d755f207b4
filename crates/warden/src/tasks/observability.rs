//! Observability sink task
//!
//! Ships an enriched event envelope to an HTTP collector. The sink is a
//! collaborator: delivery failures are silent to the user (a system message
//! appears only under `verbose_logging`) and never influence a verdict.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use warden_core::config::task_config;
use warden_core::{Result, TaskResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObservabilityConfig {
    /// Collector endpoint; the task is inert without one
    endpoint: Option<String>,
    /// Source identifier attached to every envelope
    source_name: Option<String>,
}

pub struct ObservabilityTask;

#[async_trait]
impl Task for ObservabilityTask {
    fn name(&self) -> &'static str {
        "observability"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let config: ObservabilityConfig = task_config(ctx.config)?;
        let Some(endpoint) = config.endpoint else {
            return Ok(None);
        };

        let source = config
            .source_name
            .or_else(|| ctx.global.agent_name.clone())
            .unwrap_or_else(|| "warden".to_string());

        let envelope = json!({
            "source_agent": source,
            "session_id": ctx.event.session_id,
            "hook_kind": ctx.hook.as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "payload": ctx.event,
        });

        let outcome = async {
            let client = reqwest::Client::builder()
                .timeout(ctx.global.subprocess_timeout())
                .build()?;
            client
                .post(&endpoint)
                .json(&envelope)
                .send()
                .await?
                .error_for_status()?;
            Ok::<(), reqwest::Error>(())
        }
        .await;

        match outcome {
            Ok(()) => Ok(None),
            Err(e) => {
                tracing::debug!("observability post to {endpoint} failed: {e}");
                if ctx.global.verbose_logging {
                    Ok(Some(TaskResponse::with_message(format!(
                        "Observability sink unreachable: {e}"
                    ))))
                } else {
                    Ok(None)
                }
            }
        }
    }
}
