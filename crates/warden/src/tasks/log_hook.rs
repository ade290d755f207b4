//! Hook logging task
//!
//! Appends the raw event to the per-kind log file. Failures stay quiet
//! unless `show_errors` is set; logging must never influence a verdict.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use warden_core::config::task_config;
use warden_core::hook_log::append_record;
use warden_core::{Result, TaskResponse};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogHookConfig {
    /// Override the log file's hook-kind name
    hook_name: Option<String>,
}

pub struct LogHookTask;

#[async_trait]
impl Task for LogHookTask {
    fn name(&self) -> &'static str {
        "log_hook"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let config: LogHookConfig = task_config(ctx.config)?;
        let hook_name = config
            .hook_name
            .unwrap_or_else(|| ctx.hook.as_str().to_string());

        let log_dir = ctx.project.log_dir(ctx.global);
        let record = serde_json::to_value(ctx.event)?;

        if let Err(e) = append_record(&log_dir, &hook_name, record) {
            tracing::warn!("log_hook failed to append to {hook_name}.json: {e}");
            if ctx.global.show_errors {
                return Ok(Some(TaskResponse::with_message(format!(
                    "Log hook error: {e}"
                ))));
            }
        }

        Ok(None)
    }
}
