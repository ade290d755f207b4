//! Worktree permissions configuration document

use crate::Permission;
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// An `always_deny` entry with its reason
///
/// The document accepts both a bare pattern string and a
/// `{pattern, reason}` mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct DenyRule {
    pub pattern: String,
    pub reason: String,
}

const DEFAULT_DENY_REASON: &str = "Tool denied by always_deny rule";

impl<'de> Deserialize<'de> for DenyRule {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Pattern(String),
            Full {
                pattern: String,
                #[serde(default)]
                reason: Option<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Pattern(pattern) => DenyRule {
                pattern,
                reason: DEFAULT_DENY_REASON.to_string(),
            },
            Raw::Full { pattern, reason } => DenyRule {
                pattern,
                reason: reason.unwrap_or_else(|| DEFAULT_DENY_REASON.to_string()),
            },
        })
    }
}

/// Global section of the document
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalSection {
    pub enabled: bool,
    pub default_permission: Permission,
    pub enforce_boundaries: bool,
    pub always_allow: Vec<String>,
    pub always_deny: Vec<DenyRule>,
}

impl Default for GlobalSection {
    fn default() -> Self {
        Self {
            enabled: true,
            default_permission: Permission::Ask,
            enforce_boundaries: true,
            always_allow: Vec::new(),
            always_deny: Vec::new(),
        }
    }
}

/// Main-worktree section: disabled by default so the main checkout stays
/// ungoverned unless explicitly opted in
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainWorktreeSection {
    pub enabled: bool,
    pub permissions: IndexMap<String, Permission>,
}

/// One branch-type entry
#[derive(Debug, Clone, Deserialize)]
pub struct BranchPermissionEntry {
    pub branch_types: Vec<String>,
    pub reason: String,
    #[serde(default)]
    pub permissions: IndexMap<String, Permission>,
}

/// Fallback for branches whose type matches no entry
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UnknownBranchSection {
    pub reason: String,
    pub permissions: IndexMap<String, Permission>,
}

impl Default for UnknownBranchSection {
    fn default() -> Self {
        Self {
            reason: "Unrecognised branch type".to_string(),
            permissions: IndexMap::new(),
        }
    }
}

/// Complete worktree permissions document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorktreePermissions {
    pub global: GlobalSection,
    pub main_worktree: MainWorktreeSection,
    pub branch_permissions: Vec<BranchPermissionEntry>,
    pub unknown_branch: UnknownBranchSection,
}

impl WorktreePermissions {
    /// Load the document from a YAML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(WorktreePermissions::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(WorktreePermissions::default());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// The branch entry covering a branch type, if any
    pub fn entry_for_branch_type(&self, branch_type: &str) -> Option<&BranchPermissionEntry> {
        self.branch_permissions
            .iter()
            .find(|entry| entry.branch_types.iter().any(|t| t == branch_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
global:
  enabled: true
  default_permission: Ask
  enforce_boundaries: true
  always_allow:
    - "Read"
    - "Bash(git status:*)"
  always_deny:
    - "Bash(git push --force:*)"
    - pattern: "Bash(sudo:*)"
      reason: "No privilege escalation from worktrees"

main_worktree:
  enabled: false

branch_permissions:
  - branch_types: ["feat", "fix"]
    reason: "Feature work"
    permissions:
      "Bash(git push:*)": ask
      "Write": allow

unknown_branch:
  reason: "Unknown branch type"
  permissions:
    "Bash(rm:*)": DENY
"#;

    #[test]
    fn test_load_full_document() {
        let config: WorktreePermissions = serde_yaml::from_str(DOC).unwrap();
        assert!(config.global.enabled);
        assert_eq!(config.global.default_permission, Permission::Ask);
        assert_eq!(config.global.always_allow.len(), 2);

        // Bare string and mapping forms both normalise to DenyRule
        assert_eq!(config.global.always_deny[0].reason, DEFAULT_DENY_REASON);
        assert_eq!(
            config.global.always_deny[1].reason,
            "No privilege escalation from worktrees"
        );

        assert!(!config.main_worktree.enabled);
        let entry = config.entry_for_branch_type("fix").unwrap();
        assert_eq!(entry.permissions["Bash(git push:*)"], Permission::Ask);

        // Permission lexemes are case-insensitive
        assert_eq!(
            config.unknown_branch.permissions["Bash(rm:*)"],
            Permission::Deny
        );
    }

    #[test]
    fn test_defaults_for_empty_document() {
        let config = WorktreePermissions::default();
        assert!(config.global.enabled);
        assert!(config.global.enforce_boundaries);
        assert_eq!(config.global.default_permission, Permission::Ask);
        assert!(!config.main_worktree.enabled);
        assert!(config.branch_permissions.is_empty());
    }

    #[test]
    fn test_unknown_branch_type_lookup() {
        let config: WorktreePermissions = serde_yaml::from_str(DOC).unwrap();
        assert!(config.entry_for_branch_type("docs").is_none());
    }

    #[test]
    fn test_invalid_permission_is_rejected() {
        let doc = r#"
branch_permissions:
  - branch_types: ["feat"]
    reason: "x"
    permissions:
      "Write": maybe
"#;
        assert!(serde_yaml::from_str::<WorktreePermissions>(doc).is_err());
    }
}
