//! Settings-file allow/deny task
//!
//! An additional permission table sourced from a Claude-style settings JSON:
//! `permissions.allow` and `permissions.deny` hold tool-identifier patterns.
//! Deny wins over allow; when neither fires the configured
//! `default_permission` applies, and an absent or `ignore` default keeps the
//! task silent so it cannot mask the other deciders.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use warden_core::config::task_config;
use warden_core::pattern::{format_tool_identifier, identifier_matches_pattern};
use warden_core::response::HookOutput;
use warden_core::{Permission, PermissionDecision, Result, TaskResponse};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SettingsTaskConfig {
    settings_file: String,
    default_permission: Option<Permission>,
}

impl Default for SettingsTaskConfig {
    fn default() -> Self {
        Self {
            settings_file: ".claude/settings.json".to_string(),
            default_permission: None,
        }
    }
}

/// The slice of the settings document this task reads
#[derive(Debug, Default, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    permissions: SettingsPermissions,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsPermissions {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
}

pub struct SettingsPermissionsTask;

#[async_trait]
impl Task for SettingsPermissionsTask {
    fn name(&self) -> &'static str {
        "settings_permissions"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let config: SettingsTaskConfig = task_config(ctx.config)?;

        if !ctx.event.has_tool_call() {
            return Ok(None);
        }

        let settings_path = ctx.project.resolve_data_path(&config.settings_file);
        let settings = load_settings(&settings_path);

        let identifier =
            format_tool_identifier(ctx.event.tool_name(), ctx.event.tool_input.as_ref());

        for pattern in &settings.permissions.deny {
            if identifier_matches_pattern(&identifier, pattern) {
                return Ok(Some(permission_response(
                    PermissionDecision::Deny,
                    pattern,
                    format!("Tool '{identifier}' is denied by settings"),
                )));
            }
        }

        for pattern in &settings.permissions.allow {
            if identifier_matches_pattern(&identifier, pattern) {
                return Ok(Some(permission_response(
                    PermissionDecision::Allow,
                    pattern,
                    format!("Tool '{identifier}' is allowed by settings"),
                )));
            }
        }

        match config.default_permission {
            Some(default) if default != Permission::Ignore => {
                Ok(default.decision().map(|decision| TaskResponse {
                    hook_specific_output: Some(HookOutput::permission(
                        decision,
                        format!("Default permission for '{identifier}': {decision}"),
                    )),
                    ..Default::default()
                }))
            }
            _ => Ok(None),
        }
    }
}

fn permission_response(
    decision: PermissionDecision,
    pattern: &str,
    reason: String,
) -> TaskResponse {
    TaskResponse {
        hook_specific_output: Some(HookOutput::permission(
            decision,
            format!("[{pattern}] {reason}"),
        )),
        ..Default::default()
    }
}

/// Read the settings document, treating missing or corrupt files as empty
fn load_settings(path: &std::path::Path) -> SettingsDocument {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}
