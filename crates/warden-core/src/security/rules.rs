//! Security rules document
//!
//! The rules file has two top-level lists, `whitelist` and `blacklist`, each
//! mapping a permission level to groups of file rules and command rules.
//! The whitelist is evaluated strictly before the blacklist, so a matching
//! whitelist rule short-circuits everything below it.

use crate::error::{Result, SecurityError, WardenError};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Full security rules document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityRules {
    #[serde(default)]
    pub whitelist: RuleList,
    #[serde(default)]
    pub blacklist: RuleList,
}

/// Rules for one list, keyed by permission level
///
/// Within a list, `deny` is consulted before `ask` before `allow`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleList {
    #[serde(default)]
    pub deny: RuleGroup,
    #[serde(default)]
    pub ask: RuleGroup,
    #[serde(default)]
    pub allow: RuleGroup,
}

/// File and command rules sharing one permission level
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleGroup {
    #[serde(default)]
    pub files: Vec<FileRule>,
    #[serde(default)]
    pub commands: Vec<CommandRule>,
}

/// Gitignore-style file pattern rule
#[derive(Debug, Clone, Deserialize)]
pub struct FileRule {
    /// Gitignore-style glob, case-insensitive; a leading `!` marks whitelist
    /// intent and is stripped before matching
    pub pattern: String,

    /// Tools this rule applies to; empty means all file-capable tools
    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Shell command rule
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRule {
    /// Literal base command, possibly multi-word (`rm`, `git push`)
    pub command: String,

    /// Flag conjunctions: the rule fires when every token of at least one
    /// inner list appears as a whole word
    #[serde(default)]
    pub flags: Vec<Vec<String>>,

    /// Literal path arguments matched as full tokens; a variable reference
    /// in any non-flag token also satisfies this condition
    #[serde(default)]
    pub paths: Vec<String>,

    /// Regexes applied to the full original command
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Match on the base command alone, ignoring all other conditions
    #[serde(default)]
    pub block_always: bool,

    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl CommandRule {
    /// Compile this rule's regex patterns, failing on the first bad one
    pub fn compiled_patterns(&self) -> Result<Vec<Regex>> {
        self.patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    WardenError::Security(SecurityError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

impl SecurityRules {
    /// Load rules from a YAML file; a missing file is an empty document
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(SecurityRules::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(SecurityRules::default());
        }
        let rules: SecurityRules = serde_yaml::from_str(&raw)?;
        Ok(rules)
    }

    /// Iterate `(permission, group)` in evaluation order for one list
    pub fn groups_in_order(list: &RuleList) -> [(crate::Permission, &RuleGroup); 3] {
        [
            (crate::Permission::Deny, &list.deny),
            (crate::Permission::Ask, &list.ask),
            (crate::Permission::Allow, &list.allow),
        ]
    }
}
