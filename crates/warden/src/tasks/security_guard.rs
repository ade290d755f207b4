//! Security guard task
//!
//! Checks tool calls against the security rules document: file rules with
//! gitignore-style patterns and command rules with the two-phase shell
//! matcher. In `validate_only` mode (wired for `session_start`) it checks
//! the document's structure instead and halts the session when the rules
//! are broken.

use crate::tasks::{Task, TaskContext};
use async_trait::async_trait;
use serde::Deserialize;
use warden_core::config::task_config;
use warden_core::response::{Decision, HookOutput};
use warden_core::security::{self, SecurityRules, validate_security_rules};
use warden_core::{Result, TaskResponse};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GuardConfig {
    rules_file: String,
    validate_only: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rules_file: "security-rules.yaml".to_string(),
            validate_only: false,
        }
    }
}

pub struct SecurityGuardTask;

#[async_trait]
impl Task for SecurityGuardTask {
    fn name(&self) -> &'static str {
        "security_guard"
    }

    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>> {
        let config: GuardConfig = task_config(ctx.config)?;
        let rules_path = ctx.project.resolve_config_path(&config.rules_file);
        let rules = SecurityRules::load(&rules_path)?;

        if config.validate_only {
            return Ok(validate_rules(&rules));
        }

        if !ctx.event.has_tool_call() {
            return Ok(None);
        }

        let matched = security::evaluate(
            ctx.event.tool_name(),
            ctx.event.tool_input.as_ref(),
            &rules,
        );

        Ok(matched.and_then(|matched| {
            let decision = matched.permission.decision()?;
            let reason = format!("[{}] {}", matched.matched, matched.message);
            Some(TaskResponse {
                hook_specific_output: Some(HookOutput::permission(decision, reason)),
                ..Default::default()
            })
        }))
    }
}

fn validate_rules(rules: &SecurityRules) -> Option<TaskResponse> {
    let errors = validate_security_rules(rules);
    if errors.is_empty() {
        return Some(TaskResponse::with_message(
            "Security rules validated successfully",
        ));
    }

    Some(TaskResponse {
        continue_: Some(false),
        decision: Some(Decision::Block),
        reason: Some("Security rules validation failed".to_string()),
        stop_reason: Some(format!(
            "Security rules validation failed:\n{}",
            errors.join("\n")
        )),
        system_message: Some(format!(
            "Security rules validation failed with {} error(s)",
            errors.len()
        )),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_core::config::{GlobalConfig, Project};
    use warden_core::{HookEvent, HookKind, PermissionDecision};

    fn write_rules(dir: &std::path::Path, body: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("security-rules.yaml"), body).unwrap();
    }

    fn context<'a>(
        event: &'a HookEvent,
        project: &'a Project,
        global: &'a GlobalConfig,
        config: &'a serde_yaml::Value,
    ) -> TaskContext<'a> {
        TaskContext {
            event,
            hook: HookKind::PreToolUse,
            global,
            project,
            config,
        }
    }

    #[tokio::test]
    async fn test_denies_env_file_write() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_config_dir(dir.path().join(".warden"));
        write_rules(
            project.config_dir(),
            r#"
blacklist:
  deny:
    files:
      - pattern: ".env"
        message: "Sensitive environment file"
"#,
        );

        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            tool_name: Some("Write".into()),
            tool_input: Some(json!({"file_path": "/w/.env"})),
            ..Default::default()
        };
        let global = GlobalConfig::default();
        let blob = serde_yaml::Value::Null;

        let response = SecurityGuardTask
            .run(&context(&event, &project, &global, &blob))
            .await
            .unwrap()
            .unwrap();

        let output = response.hook_specific_output.unwrap();
        let permission = output.as_permission().unwrap();
        assert_eq!(permission.permission_decision, PermissionDecision::Deny);
        assert!(permission.permission_decision_reason.contains(".env"));
    }

    #[tokio::test]
    async fn test_missing_rules_file_decides_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_config_dir(dir.path().join(".warden"));
        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            tool_name: Some("Bash".into()),
            tool_input: Some(json!({"command": "ls"})),
            ..Default::default()
        };
        let global = GlobalConfig::default();
        let blob = serde_yaml::Value::Null;

        let response = SecurityGuardTask
            .run(&context(&event, &project, &global, &blob))
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_validate_only_halts_on_broken_rules() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_config_dir(dir.path().join(".warden"));
        write_rules(
            project.config_dir(),
            r#"
blacklist:
  deny:
    commands:
      - command: ""
"#,
        );

        let event = HookEvent {
            hook_event_name: "session_start".into(),
            source: Some("startup".into()),
            ..Default::default()
        };
        let global = GlobalConfig::default();
        let blob = serde_yaml::from_str("validate_only: true").unwrap();

        let response = SecurityGuardTask
            .run(&context(&event, &project, &global, &blob))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.continue_, Some(false));
        assert!(response.stop_reason.unwrap().contains("validation failed"));
    }

    #[tokio::test]
    async fn test_validate_only_passes_clean_rules() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_config_dir(dir.path().join(".warden"));
        write_rules(
            project.config_dir(),
            r#"
blacklist:
  deny:
    files:
      - pattern: ".env"
"#,
        );

        let event = HookEvent {
            hook_event_name: "session_start".into(),
            source: Some("startup".into()),
            ..Default::default()
        };
        let global = GlobalConfig::default();
        let blob = serde_yaml::from_str("validate_only: true").unwrap();

        let response = SecurityGuardTask
            .run(&context(&event, &project, &global, &blob))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.continue_, None);
        assert!(response.system_message.unwrap().contains("validated"));
    }
}
