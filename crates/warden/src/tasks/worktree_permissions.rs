//! Worktree permissions task
//!
//! Judges tool calls by git worktree context: branch-type permission tables,
//! always-allow/always-deny lists, and worktree boundary enforcement. The
//! task is a no-op whenever context cannot be established: git missing,
//! `cwd` gone, or not a worktree.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use warden_core::Permission;
use warden_core::config::task_config;
use warden_core::response::HookOutput;
use warden_core::worktree::{
    WorktreePermissions, check_tool_permission, detect_worktree_context,
};
use warden_core::{Result, TaskResponse};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WorktreeTaskConfig {
    config_file: String,
}

impl Default for WorktreeTaskConfig {
    fn default() -> Self {
        Self {
            config_file: "worktree-permissions.yaml".to_string(),
        }
    }
}

pub struct WorktreePermissionsTask;

#[async_trait]
impl Task for WorktreePermissionsTask {
    fn name(&self) -> &'static str {
        "worktree_permissions"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let task_cfg: WorktreeTaskConfig = task_config(ctx.config)?;
        let config_path = ctx.project.resolve_config_path(&task_cfg.config_file);
        let config = WorktreePermissions::load(&config_path)?;

        if !config.global.enabled {
            return Ok(verbose_message(ctx, "Worktree permissions are disabled"));
        }

        if !ctx.event.has_tool_call() {
            return Ok(verbose_message(ctx, "No tool to check, passing through"));
        }

        let cwd = &ctx.event.cwd;
        if !cwd.is_dir() {
            if ctx.global.show_errors {
                return Ok(Some(TaskResponse::with_message(format!(
                    "Worktree permissions: working directory does not exist: {}",
                    cwd.display()
                ))));
            }
            return Ok(None);
        }

        let Some(context) =
            detect_worktree_context(cwd, ctx.global.subprocess_timeout()).await
        else {
            return Ok(verbose_message(ctx, "Not in a git worktree, passing through"));
        };

        let result = check_tool_permission(
            ctx.event.tool_name(),
            ctx.event.tool_input.as_ref(),
            &context,
            &config,
            cwd,
        );

        if result.permission == Permission::Ignore {
            return Ok(verbose_message(
                ctx,
                format!("Worktree permissions: IGNORE - {}", result.reason),
            ));
        }

        let Some(decision) = result.permission.decision() else {
            return Ok(None);
        };

        let mut response = TaskResponse {
            hook_specific_output: Some(HookOutput::permission(
                decision,
                result.decision_reason(),
            )),
            ..Default::default()
        };

        if ctx.global.verbose_logging {
            response.system_message = Some(format!(
                "Worktree permission check for tool={}\n\
                 Context: worktree={}, branch={}, type={}\n\
                 Decision: {}\n\
                 Reason: {}",
                ctx.event.tool_name(),
                context.worktree_root.display(),
                context.branch_name.as_deref().unwrap_or("-"),
                context.branch_type.as_deref().unwrap_or("-"),
                decision,
                result.reason,
            ));
        }

        Ok(Some(response))
    }
}

fn verbose_message(ctx: &TaskContext<'_>, message: impl Into<String>) -> Option<TaskResponse> {
    if ctx.global.verbose_logging {
        Some(TaskResponse::with_message(message))
    } else {
        None
    }
}
