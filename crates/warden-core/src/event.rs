//! Hook event payload received from the host
//!
//! The host pipes one JSON event per invocation on stdin. The event carries a
//! small set of base fields plus event-specific optional fields; anything the
//! host sends that we do not model is preserved in `extra` and forwarded to
//! tasks untouched.

use crate::hook_kinds::HookKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Tools that read or write a single file through a `file_path` argument
pub const FILE_TOOLS: &[&str] = &["Read", "Edit", "MultiEdit", "Write", "NotebookEdit"];

/// Tools that modify files and are subject to worktree boundary enforcement
///
/// `Read` is deliberately absent: reading outside the worktree is allowed.
pub const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Hook event from the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookEvent {
    /// Opaque session identifier
    #[serde(default)]
    pub session_id: String,

    /// Path to the newline-delimited JSON transcript
    #[serde(default)]
    pub transcript_path: PathBuf,

    /// Host's current working directory
    #[serde(default)]
    pub cwd: PathBuf,

    /// Hook kind name (snake_case: pre_tool_use, post_tool_use, ...)
    #[serde(default)]
    pub hook_event_name: String,

    /// Name of the tool about to run (tool hooks only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    /// Tool input parameters (tool-specific JSON)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<Value>,

    /// Tool execution result (post_tool_use only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_response: Option<Value>,

    /// Notification message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// User's prompt text (user_prompt_submit only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Whether a stop hook is already active (stop/subagent_stop)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_hook_active: Option<bool>,

    /// Compaction trigger ("manual" or "auto", pre_compact only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Custom compaction instructions (pre_compact only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,

    /// Session source ("startup", "resume", or "clear", session_start only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Unknown fields, preserved verbatim for tasks
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl HookEvent {
    /// The typed hook kind, if `hook_event_name` is recognised
    pub fn kind(&self) -> Option<HookKind> {
        HookKind::try_from_str(&self.hook_event_name)
    }

    /// The tool name, or empty string for non-tool events
    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    /// True when both a tool name and a tool input are present
    pub fn has_tool_call(&self) -> bool {
        self.tool_name.as_deref().is_some_and(|n| !n.is_empty()) && self.tool_input.is_some()
    }

    /// A tagged view over `(tool_name, tool_input)` for matcher routing
    pub fn tool_payload(&self) -> ToolPayload<'_> {
        ToolPayload::from_parts(self.tool_name(), self.tool_input.as_ref())
    }
}

/// Tagged view over the heterogeneous `tool_input` payload
///
/// Matchers route by tag; shapes the core does not care about fall through
/// as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolPayload<'a> {
    /// A `Bash` invocation with its command string
    Bash { command: &'a str },
    /// A file tool with its `file_path` argument
    File { file_path: &'a str },
    /// Anything else
    Other,
}

impl<'a> ToolPayload<'a> {
    pub fn from_parts(tool_name: &str, tool_input: Option<&'a Value>) -> Self {
        let Some(input) = tool_input else {
            return ToolPayload::Other;
        };
        if tool_name == "Bash" {
            if let Some(command) = input.get("command").and_then(Value::as_str) {
                return ToolPayload::Bash { command };
            }
        } else if FILE_TOOLS.contains(&tool_name) {
            if let Some(file_path) = input.get("file_path").and_then(Value::as_str) {
                return ToolPayload::File { file_path };
            }
        }
        ToolPayload::Other
    }

    /// The Bash command, if this is a Bash payload
    pub fn command(&self) -> Option<&'a str> {
        match self {
            ToolPayload::Bash { command } => Some(command),
            _ => None,
        }
    }

    /// The file path, if this is a file-tool payload
    pub fn file_path(&self) -> Option<&'a str> {
        match self {
            ToolPayload::File { file_path } => Some(file_path),
            _ => None,
        }
    }
}
