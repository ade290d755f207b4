//! Task dispatcher
//!
//! Runs the tasks declared for one hook kind, in declared order, and merges
//! their responses. The pipeline fails open at every step: a disabled task
//! is skipped, an unknown task name or a task error becomes at most a
//! diagnostic system message, and the dispatcher always produces a response.

use crate::tasks::{TaskContext, TaskRegistry};
use warden_core::config::{GlobalConfig, HooksConfig, Project};
use warden_core::response::merge_task_responses;
use warden_core::{AggregateResponse, HookEvent, HookKind, TaskResponse};

pub struct Dispatcher {
    registry: TaskRegistry,
    hooks: HooksConfig,
    global: GlobalConfig,
    project: Project,
}

impl Dispatcher {
    pub fn new(project: Project, global: GlobalConfig, hooks: HooksConfig) -> Self {
        Self {
            registry: TaskRegistry::build(),
            hooks,
            global,
            project,
        }
    }

    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    /// Run all tasks for a hook kind and merge their responses
    pub async fn dispatch(&self, kind: HookKind, event: &HookEvent) -> AggregateResponse {
        let Some(tasks) = self.hooks.tasks_for(kind.as_str()) else {
            return AggregateResponse::with_message(format!(
                "No {} hook in configuration",
                kind.as_str()
            ));
        };

        let verbose = self.global.verbose_logging;
        let mut responses: Vec<(String, TaskResponse)> = Vec::new();

        for (task_name, spec) in tasks {
            if !spec.enabled {
                if verbose {
                    responses.push((
                        task_name.clone(),
                        TaskResponse::with_message("Task is disabled. Skipping."),
                    ));
                }
                continue;
            }

            let registry_name = spec.task.as_deref().unwrap_or(task_name.as_str());
            let Some(task) = self.registry.get(registry_name) else {
                tracing::warn!("no task registered under '{registry_name}'");
                if verbose {
                    responses.push((
                        task_name.clone(),
                        TaskResponse::with_message(format!(
                            "Error: no task registered under '{registry_name}'"
                        )),
                    ));
                }
                continue;
            };

            let ctx = TaskContext {
                event,
                hook: kind,
                global: &self.global,
                project: &self.project,
                config: &spec.config,
            };

            match task.run(&ctx).await {
                Ok(Some(response)) => responses.push((task_name.clone(), response)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("task '{task_name}' failed: {e}");
                    if verbose {
                        responses.push((
                            task_name.clone(),
                            TaskResponse::with_message(format!(
                                "An unexpected error occurred running task '{task_name}': {e}"
                            )),
                        ));
                    }
                }
            }
        }

        merge_task_responses(&responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_core::PermissionDecision;

    fn write(path: &std::path::Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn project_with(hooks: &str, configs: &[(&str, &str)]) -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::with_config_dir(dir.path().join(".warden"));
        write(&project.hooks_file(), hooks);
        for (name, body) in configs {
            write(&project.config_dir().join(name), body);
        }
        let global = GlobalConfig::load(&project.global_config_file()).unwrap();
        let hooks = HooksConfig::load(&project.hooks_file()).unwrap();
        let dispatcher = Dispatcher::new(project, global, hooks);
        (dir, dispatcher)
    }

    #[tokio::test]
    async fn test_unconfigured_hook_reports_miss() {
        let (_dir, dispatcher) = project_with("stop: {}", &[]);
        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            ..Default::default()
        };
        let response = dispatcher.dispatch(HookKind::PreToolUse, &event).await;
        assert!(response.continue_);
        assert!(
            response
                .system_message
                .unwrap()
                .contains("No pre_tool_use hook")
        );
    }

    #[tokio::test]
    async fn test_disabled_tasks_are_skipped() {
        let hooks = r#"
pre_tool_use:
  security_guard:
    enabled: false
"#;
        let (_dir, dispatcher) = project_with(hooks, &[]);
        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            tool_name: Some("Bash".into()),
            tool_input: Some(json!({"command": "ls"})),
            ..Default::default()
        };
        let response = dispatcher.dispatch(HookKind::PreToolUse, &event).await;
        assert!(response.continue_);
        assert!(response.system_message.is_none());
        assert!(response.hook_specific_output.is_none());
    }

    #[tokio::test]
    async fn test_unknown_task_does_not_abort_pipeline() {
        let hooks = r#"
pre_tool_use:
  mystery:
    enabled: true
    task: not_a_real_task
  security_guard:
    enabled: true
"#;
        let rules = r#"
blacklist:
  deny:
    files:
      - pattern: ".env"
"#;
        let (_dir, dispatcher) = project_with(hooks, &[("security-rules.yaml", rules)]);
        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            tool_name: Some("Write".into()),
            tool_input: Some(json!({"file_path": "/w/.env"})),
            ..Default::default()
        };
        let response = dispatcher.dispatch(HookKind::PreToolUse, &event).await;
        let output = response.hook_specific_output.unwrap();
        assert_eq!(
            output.as_permission().unwrap().permission_decision,
            PermissionDecision::Deny
        );
    }

    #[tokio::test]
    async fn test_declared_order_drives_tiebreak() {
        // Both tasks return ask; the later one supplies the winning reason
        let hooks = r#"
pre_tool_use:
  settings_permissions:
    enabled: true
    config:
      default_permission: ask
  second_opinion:
    enabled: true
    task: settings_permissions
    config:
      default_permission: ask
      settings_file: other-settings.json
"#;
        let (_dir, dispatcher) = project_with(hooks, &[]);
        let event = HookEvent {
            hook_event_name: "pre_tool_use".into(),
            tool_name: Some("Bash".into()),
            tool_input: Some(json!({"command": "cargo build"})),
            ..Default::default()
        };
        let response = dispatcher.dispatch(HookKind::PreToolUse, &event).await;
        let output = response.hook_specific_output.unwrap();
        let permission = output.as_permission().unwrap();
        assert_eq!(permission.permission_decision, PermissionDecision::Ask);
    }
}
