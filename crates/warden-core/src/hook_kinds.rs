//! Hook kind constants and types
//!
//! Single source of truth for the hook event names the host sends in the
//! `hook_event_name` field and on the command line.

use std::fmt::{self, Display};

/// Hook event name constants
///
/// These must match the host's `hook_event_name` strings exactly.
pub mod kind_constants {
    pub const PRE_TOOL_USE: &str = "pre_tool_use";
    pub const POST_TOOL_USE: &str = "post_tool_use";
    pub const NOTIFICATION: &str = "notification";
    pub const STOP: &str = "stop";
    pub const SUBAGENT_STOP: &str = "subagent_stop";
    pub const USER_PROMPT_SUBMIT: &str = "user_prompt_submit";
    pub const PRE_COMPACT: &str = "pre_compact";
    pub const SESSION_START: &str = "session_start";

    /// All valid hook kind names as a slice
    pub const ALL_KINDS: &[&str] = &[
        PRE_TOOL_USE,
        POST_TOOL_USE,
        NOTIFICATION,
        STOP,
        SUBAGENT_STOP,
        USER_PROMPT_SUBMIT,
        PRE_COMPACT,
        SESSION_START,
    ];
}

/// Strongly-typed enum for the hook kinds the dispatcher recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HookKind {
    PreToolUse,
    PostToolUse,
    Notification,
    Stop,
    SubagentStop,
    UserPromptSubmit,
    PreCompact,
    SessionStart,
}

impl HookKind {
    /// Get all hook kinds
    pub const fn all() -> &'static [HookKind] {
        &[
            HookKind::PreToolUse,
            HookKind::PostToolUse,
            HookKind::Notification,
            HookKind::Stop,
            HookKind::SubagentStop,
            HookKind::UserPromptSubmit,
            HookKind::PreCompact,
            HookKind::SessionStart,
        ]
    }

    /// Parse a hook kind from its wire name (fallible)
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            kind_constants::PRE_TOOL_USE => Some(HookKind::PreToolUse),
            kind_constants::POST_TOOL_USE => Some(HookKind::PostToolUse),
            kind_constants::NOTIFICATION => Some(HookKind::Notification),
            kind_constants::STOP => Some(HookKind::Stop),
            kind_constants::SUBAGENT_STOP => Some(HookKind::SubagentStop),
            kind_constants::USER_PROMPT_SUBMIT => Some(HookKind::UserPromptSubmit),
            kind_constants::PRE_COMPACT => Some(HookKind::PreCompact),
            kind_constants::SESSION_START => Some(HookKind::SessionStart),
            _ => None,
        }
    }

    /// The wire name of this hook kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            HookKind::PreToolUse => kind_constants::PRE_TOOL_USE,
            HookKind::PostToolUse => kind_constants::POST_TOOL_USE,
            HookKind::Notification => kind_constants::NOTIFICATION,
            HookKind::Stop => kind_constants::STOP,
            HookKind::SubagentStop => kind_constants::SUBAGENT_STOP,
            HookKind::UserPromptSubmit => kind_constants::USER_PROMPT_SUBMIT,
            HookKind::PreCompact => kind_constants::PRE_COMPACT,
            HookKind::SessionStart => kind_constants::SESSION_START,
        }
    }

    /// Check if this is a tool-related hook
    pub const fn is_tool_hook(&self) -> bool {
        matches!(self, HookKind::PreToolUse | HookKind::PostToolUse)
    }
}

impl Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HookKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        HookKind::try_from_str(s).ok_or_else(|| {
            format!(
                "unrecognised hook kind '{s}' (expected one of: {})",
                kind_constants::ALL_KINDS.join(", ")
            )
        })
    }
}
