//! Configuration documents and project layout
//!
//! Two documents drive the dispatcher: `hooks.yaml` declares which tasks run
//! for which hook kind, in declared order (the merge tie-break depends on
//! it), and `config.yaml` carries the global knobs shared by every task.
//! Both live in the project's config directory, `.warden/` by default.

use crate::error::{ConfigError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration shared by all tasks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Directory for hook log files, relative to the project root
    pub log_directory: String,

    /// Directory for per-session files, relative to the project root
    pub sessions_directory: String,

    /// Budget in seconds for any external call (git, HTTP, TTS)
    pub subprocess_timeout: u64,

    /// Attach diagnostic system messages to responses
    pub verbose_logging: bool,

    /// Surface task errors as system messages
    pub show_errors: bool,

    /// Name announced by notification tasks
    pub agent_name: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_directory: "logs".to_string(),
            sessions_directory: "sessions".to_string(),
            subprocess_timeout: 10,
            verbose_logging: false,
            show_errors: false,
            agent_name: None,
        }
    }
}

impl GlobalConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(GlobalConfig::default());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    pub fn subprocess_timeout(&self) -> Duration {
        Duration::from_secs(self.subprocess_timeout)
    }
}

/// One task declaration inside a hook entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskSpec {
    /// Tasks run only when explicitly enabled
    pub enabled: bool,

    /// Registry name of the implementation; defaults to the map key
    pub task: Option<String>,

    /// Task-specific configuration blob, passed through untouched
    pub config: serde_yaml::Value,
}

/// Ordered task declarations for one hook kind
pub type HookTasks = IndexMap<String, TaskSpec>;

/// The full hooks document: hook kind → ordered task declarations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksConfig(pub IndexMap<String, HookTasks>);

impl HooksConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(HooksConfig::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(HooksConfig::default());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Task declarations for a hook kind, in declared order
    pub fn tasks_for(&self, hook_kind: &str) -> Option<&HookTasks> {
        self.0.get(hook_kind)
    }
}

/// Project layout: root directory plus the config directory inside it
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config_dir: PathBuf,
}

/// Directory name searched for during project-root discovery
pub const CONFIG_DIR_NAME: &str = ".warden";

impl Project {
    /// Discover the project root by walking up from `start` to the first
    /// directory containing `.git` or the config directory; falls back to
    /// `start` itself.
    pub fn discover(start: &Path) -> Self {
        let start = dunce::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
        let mut dir = start.as_path();
        loop {
            if dir.join(".git").exists() || dir.join(CONFIG_DIR_NAME).exists() {
                return Self::at_root(dir.to_path_buf());
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Self::at_root(start.clone()),
            }
        }
    }

    /// Project rooted at an explicit config directory
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        let root = config_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| config_dir.clone());
        Self { root, config_dir }
    }

    fn at_root(root: PathBuf) -> Self {
        let config_dir = root.join(CONFIG_DIR_NAME);
        Self { root, config_dir }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn hooks_file(&self) -> PathBuf {
        self.config_dir.join("hooks.yaml")
    }

    pub fn global_config_file(&self) -> PathBuf {
        self.config_dir.join("config.yaml")
    }

    /// Resolve a possibly-relative config path against the config directory
    pub fn resolve_config_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Resolve a possibly-relative data path against the project root
    pub fn resolve_data_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn log_dir(&self, global: &GlobalConfig) -> PathBuf {
        self.resolve_data_path(&global.log_directory)
    }

    pub fn sessions_dir(&self, global: &GlobalConfig) -> PathBuf {
        self.resolve_data_path(&global.sessions_directory)
    }
}

/// Decode a task's config blob into a typed struct
///
/// A null blob decodes into the type's defaults; anything else must match
/// the expected shape.
pub fn task_config<T>(blob: &serde_yaml::Value) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if blob.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(blob.clone()).map_err(|e| {
        ConfigError::InvalidFormat {
            reason: format!("task config: {e}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_defaults() {
        let config = GlobalConfig::default();
        assert_eq!(config.log_directory, "logs");
        assert_eq!(config.subprocess_timeout, 10);
        assert!(!config.verbose_logging);
    }

    #[test]
    fn test_hooks_config_preserves_declared_order() {
        let doc = r#"
pre_tool_use:
  zeta_task:
    enabled: true
  alpha_task:
    enabled: true
  mid_task:
    enabled: false
"#;
        let hooks: HooksConfig = serde_yaml::from_str(doc).unwrap();
        let tasks = hooks.tasks_for("pre_tool_use").unwrap();
        let names: Vec<&str> = tasks.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta_task", "alpha_task", "mid_task"]);
        assert!(!tasks["mid_task"].enabled);
    }

    #[test]
    fn test_task_spec_with_config_blob() {
        let doc = r#"
pre_tool_use:
  security_guard:
    enabled: true
    config:
      rules_file: security-rules.yaml
"#;
        let hooks: HooksConfig = serde_yaml::from_str(doc).unwrap();
        let spec = &hooks.tasks_for("pre_tool_use").unwrap()["security_guard"];
        assert!(spec.enabled);
        assert_eq!(spec.task, None);

        #[derive(Default, serde::Deserialize)]
        #[serde(default)]
        struct GuardConfig {
            rules_file: String,
        }
        let config: GuardConfig = task_config(&spec.config).unwrap();
        assert_eq!(config.rules_file, "security-rules.yaml");
    }

    #[test]
    fn test_null_task_config_decodes_defaults() {
        #[derive(Default, serde::Deserialize, PartialEq, Debug)]
        #[serde(default)]
        struct Empty {
            flag: bool,
        }
        let decoded: Empty = task_config(&serde_yaml::Value::Null).unwrap();
        assert_eq!(decoded, Empty::default());
    }

    #[test]
    fn test_project_discovery_stops_at_marker() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        let nested = root.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::create_dir_all(root.join(CONFIG_DIR_NAME)).unwrap();

        let project = Project::discover(&nested);
        assert_eq!(
            project.root(),
            dunce::canonicalize(&root).unwrap().as_path()
        );
        assert!(project.hooks_file().ends_with(".warden/hooks.yaml"));
    }

    #[test]
    fn test_explicit_config_dir() {
        let project = Project::with_config_dir(PathBuf::from("/proj/.warden"));
        assert_eq!(project.root(), Path::new("/proj"));
        assert_eq!(
            project.resolve_config_path("rules.yaml"),
            PathBuf::from("/proj/.warden/rules.yaml")
        );
        assert_eq!(
            project.resolve_data_path("logs"),
            PathBuf::from("/proj/logs")
        );
        assert_eq!(
            project.resolve_data_path("/abs/logs"),
            PathBuf::from("/abs/logs")
        );
    }

    #[test]
    fn test_missing_files_load_as_defaults() {
        assert!(
            GlobalConfig::load(Path::new("/nope/config.yaml"))
                .unwrap()
                .log_directory
                == "logs"
        );
        assert!(
            HooksConfig::load(Path::new("/nope/hooks.yaml"))
                .unwrap()
                .tasks_for("stop")
                .is_none()
        );
    }
}
