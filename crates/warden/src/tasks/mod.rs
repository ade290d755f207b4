//! Task implementations and the task registry
//!
//! A task is a named, independently configurable unit the dispatcher invokes
//! with the event, the global config, and its own config blob. The registry
//! maps stable names to implementations at build time; the hooks document
//! references tasks by those names.

mod conversation_capture;
mod log_hook;
mod observability;
mod security_guard;
mod settings_permissions;
mod tts_notification;
mod worktree_permissions;

pub use conversation_capture::ConversationCaptureTask;
pub use log_hook::LogHookTask;
pub use observability::ObservabilityTask;
pub use security_guard::SecurityGuardTask;
pub use settings_permissions::SettingsPermissionsTask;
pub use tts_notification::TtsNotificationTask;
pub use worktree_permissions::WorktreePermissionsTask;

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use warden_core::config::{GlobalConfig, Project};
use warden_core::{HookEvent, HookKind, Result, TaskResponse};

/// Everything a task sees for one invocation
pub struct TaskContext<'a> {
    pub event: &'a HookEvent,
    pub hook: HookKind,
    pub global: &'a GlobalConfig,
    pub project: &'a Project,
    /// Task-specific configuration from the hooks document
    pub config: &'a serde_yaml::Value,
}

/// A decision-producing or collaborator unit invoked by the dispatcher
#[async_trait]
pub trait Task: Send + Sync {
    /// Stable registry name referenced by the hooks document
    fn name(&self) -> &'static str;

    /// Run the task; `None` means the task has nothing to contribute
    async fn run(&self, ctx: &TaskContext<'_>) -> Result<Option<TaskResponse>>;
}

/// Registry mapping stable names to task implementations
pub struct TaskRegistry {
    tasks: DashMap<&'static str, Arc<dyn Task>>,
}

impl TaskRegistry {
    /// Build the registry with every built-in task
    pub fn build() -> Self {
        let registry = Self {
            tasks: DashMap::new(),
        };
        registry.register(Arc::new(LogHookTask));
        registry.register(Arc::new(SecurityGuardTask));
        registry.register(Arc::new(WorktreePermissionsTask));
        registry.register(Arc::new(SettingsPermissionsTask));
        registry.register(Arc::new(ObservabilityTask));
        registry.register(Arc::new(ConversationCaptureTask));
        registry.register(Arc::new(TtsNotificationTask));
        registry
    }

    pub fn register(&self, task: Arc<dyn Task>) {
        self.tasks.insert(task.name(), task);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Task>> {
        self.tasks.get(name).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_builtin_tasks() {
        let registry = TaskRegistry::build();
        assert_eq!(registry.len(), 7);
        for name in [
            "log_hook",
            "security_guard",
            "worktree_permissions",
            "settings_permissions",
            "observability",
            "conversation_capture",
            "tts_notification",
        ] {
            assert!(registry.get(name).is_some(), "missing task: {name}");
        }
        assert!(registry.get("no_such_task").is_none());
    }
}
