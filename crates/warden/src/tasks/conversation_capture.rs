//! Conversation capture task
//!
//! Maintains a per-session file under the sessions directory with the
//! prompts the user has submitted. Only `user_prompt_submit` events carry a
//! prompt; everything else passes through.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::{Result, TaskResponse};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionRecord {
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_name: Option<String>,
    prompts: Vec<PromptRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PromptRecord {
    timestamp: String,
    prompt: String,
}

pub struct ConversationCaptureTask;

#[async_trait]
impl Task for ConversationCaptureTask {
    fn name(&self) -> &'static str {
        "conversation_capture"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let Some(prompt) = &ctx.event.prompt else {
            return Ok(None);
        };
        if ctx.event.session_id.is_empty() {
            return Ok(None);
        }

        let sessions_dir = ctx.project.sessions_dir(ctx.global);
        let path = sessions_dir.join(format!("{}.json", ctx.event.session_id));

        let mut record: SessionRecord = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        record.session_id = ctx.event.session_id.clone();
        if record.agent_name.is_none() {
            record.agent_name = ctx.global.agent_name.clone();
        }
        record.prompts.push(PromptRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            prompt: prompt.clone(),
        });

        let outcome = std::fs::create_dir_all(&sessions_dir)
            .and_then(|_| std::fs::write(&path, serde_json::to_string_pretty(&record)?));
        if let Err(e) = outcome {
            tracing::warn!("conversation_capture failed to write session file: {e}");
            if ctx.global.show_errors {
                return Ok(Some(TaskResponse::with_message(format!(
                    "Conversation capture error: {e}"
                ))));
            }
        }

        Ok(None)
    }
}
