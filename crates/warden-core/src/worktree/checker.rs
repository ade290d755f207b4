//! Worktree permission checker
//!
//! Decision flow for one tool call:
//!
//! 1. Main worktree with `main_worktree.enabled=false` → `ignore`
//! 2. Bash chains split quote-aware; each command is judged alone and the
//!    most restrictive result wins (ties go to the later command)
//! 3. `always_deny` patterns beat everything
//! 4. `always_allow` patterns
//! 5. `cd` commands are judged purely by the worktree boundary
//! 6. The permission table for the branch type (or main worktree, or
//!    unknown-branch fallback); every pattern is evaluated and the most
//!    restrictive match wins; no match falls back to the global default
//! 7. With `enforce_boundaries`, a writing tool whose `file_path` leaves the
//!    worktree is denied regardless of the table

use crate::Permission;
use crate::pattern::matches_tool_pattern;
use crate::shell::{extract_cd_target, split_commands};
use crate::worktree::boundary::{validate_cd_target, validate_tool_paths};
use crate::worktree::config::WorktreePermissions;
use crate::worktree::detect::WorktreeContext;
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::path::Path;

/// Result of a permission check, carrying the matched pattern when one fired
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionResult {
    pub permission: Permission,
    pub reason: String,
    pub matched_pattern: Option<String>,
}

impl PermissionResult {
    fn new(permission: Permission, reason: impl Into<String>) -> Self {
        Self {
            permission,
            reason: reason.into(),
            matched_pattern: None,
        }
    }

    fn with_pattern(
        permission: Permission,
        reason: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            permission,
            reason: reason.into(),
            matched_pattern: Some(pattern.into()),
        }
    }

    /// Decision reason for the wire: the matched pattern in brackets, then
    /// the human reason
    pub fn decision_reason(&self) -> String {
        match &self.matched_pattern {
            Some(pattern) => format!("[{pattern}] {}", self.reason),
            None => self.reason.clone(),
        }
    }
}

/// Check permission for a tool call in a worktree context
pub fn check_tool_permission(
    tool_name: &str,
    tool_input: Option<&Value>,
    context: &WorktreeContext,
    config: &WorktreePermissions,
    cwd: &Path,
) -> PermissionResult {
    if context.is_main && !config.main_worktree.enabled {
        return PermissionResult::new(
            Permission::Ignore,
            "Main worktree permissions are disabled",
        );
    }

    // Bash chains: judge each command alone, keep the most restrictive
    if tool_name == "Bash"
        && let Some(command) = tool_input.and_then(|i| i.get("command")).and_then(Value::as_str)
    {
        let commands = split_commands(command);
        if commands.len() > 1 {
            let mut worst: Option<PermissionResult> = None;
            for single in &commands {
                let single_input = json!({ "command": single });
                let result = check_single_permission(
                    tool_name,
                    Some(&single_input),
                    context,
                    config,
                    cwd,
                );
                worst = Some(match worst {
                    None => result,
                    Some(current) => {
                        if result.permission.rank() >= current.permission.rank() {
                            result
                        } else {
                            current
                        }
                    }
                });
            }
            if let Some(result) = worst {
                return result;
            }
        }
    }

    check_single_permission(tool_name, tool_input, context, config, cwd)
}

fn check_single_permission(
    tool_name: &str,
    tool_input: Option<&Value>,
    context: &WorktreeContext,
    config: &WorktreePermissions,
    cwd: &Path,
) -> PermissionResult {
    for rule in &config.global.always_deny {
        if matches_tool_pattern(&rule.pattern, tool_name, tool_input) {
            return PermissionResult::with_pattern(
                Permission::Deny,
                rule.reason.clone(),
                rule.pattern.clone(),
            );
        }
    }

    for pattern in &config.global.always_allow {
        if matches_tool_pattern(pattern, tool_name, tool_input) {
            return PermissionResult::with_pattern(
                Permission::Allow,
                "Tool allowed by always_allow rule",
                pattern.clone(),
            );
        }
    }

    // cd is governed by the boundary alone: always allowed inside the
    // worktree, always denied outside it
    if tool_name == "Bash"
        && let Some(command) = tool_input.and_then(|i| i.get("command")).and_then(Value::as_str)
        && let Some(target) = extract_cd_target(command)
    {
        return match validate_cd_target(&target, cwd, &context.worktree_root) {
            Some(violation) => PermissionResult::with_pattern(
                Permission::Deny,
                violation.reason,
                "cd boundary enforcement",
            ),
            None => PermissionResult::with_pattern(
                Permission::Allow,
                "cd within worktree boundary",
                "cd boundary enforcement",
            ),
        };
    }

    let table_result = lookup_permission_table(tool_name, tool_input, context, config);

    if config.global.enforce_boundaries
        && !context.is_main
        && let Some(violation) =
            validate_tool_paths(tool_name, tool_input, cwd, &context.worktree_root)
    {
        return PermissionResult::new(Permission::Deny, violation.reason);
    }

    table_result
}

fn lookup_permission_table(
    tool_name: &str,
    tool_input: Option<&Value>,
    context: &WorktreeContext,
    config: &WorktreePermissions,
) -> PermissionResult {
    if context.is_main && config.main_worktree.enabled {
        return evaluate_table(
            &config.main_worktree.permissions,
            "Main worktree permission rule",
            tool_name,
            tool_input,
            config,
        );
    }

    if let Some(branch_type) = &context.branch_type
        && let Some(entry) = config.entry_for_branch_type(branch_type)
    {
        return evaluate_table(&entry.permissions, &entry.reason, tool_name, tool_input, config);
    }

    evaluate_table(
        &config.unknown_branch.permissions,
        &config.unknown_branch.reason,
        tool_name,
        tool_input,
        config,
    )
}

/// Evaluate every pattern of a table; the most restrictive match wins and
/// ties go to the later entry. No match falls back to the global default.
fn evaluate_table(
    table: &IndexMap<String, Permission>,
    reason: &str,
    tool_name: &str,
    tool_input: Option<&Value>,
    config: &WorktreePermissions,
) -> PermissionResult {
    let mut winner: Option<(&str, Permission)> = None;

    for (pattern, permission) in table {
        if matches_tool_pattern(pattern, tool_name, tool_input)
            && winner.is_none_or(|(_, current)| permission.rank() >= current.rank())
        {
            winner = Some((pattern.as_str(), *permission));
        }
    }

    match winner {
        Some((pattern, permission)) => {
            PermissionResult::with_pattern(permission, reason, pattern)
        }
        None => PermissionResult::new(
            config.global.default_permission,
            format!("{reason} (using default permission)"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn feat_context() -> WorktreeContext {
        WorktreeContext {
            is_worktree: true,
            is_main: false,
            worktree_root: PathBuf::from("/w/worktrees/feat-x"),
            branch_name: Some("feat/x".into()),
            branch_type: Some("feat".into()),
        }
    }

    fn main_context() -> WorktreeContext {
        WorktreeContext {
            is_worktree: true,
            is_main: true,
            worktree_root: PathBuf::from("/w"),
            branch_name: Some("main".into()),
            branch_type: None,
        }
    }

    fn config() -> WorktreePermissions {
        serde_yaml::from_str(
            r#"
global:
  enabled: true
  default_permission: ask
  enforce_boundaries: true
  always_allow: ["Read"]
  always_deny:
    - pattern: "Bash(sudo:*)"
      reason: "No privilege escalation"

main_worktree:
  enabled: false

branch_permissions:
  - branch_types: ["feat"]
    reason: "Feature branch policy"
    permissions:
      "Bash(git push:*)": ask
      "Bash(git:*)": allow
      "Write": allow

unknown_branch:
  reason: "Unknown branch type"
  permissions:
    "Bash(rm:*)": deny
"#,
        )
        .unwrap()
    }

    fn bash(command: &str) -> Value {
        json!({ "command": command })
    }

    fn check(tool: &str, input: &Value, context: &WorktreeContext) -> PermissionResult {
        let cwd = context.worktree_root.clone();
        check_tool_permission(tool, Some(input), context, &config(), &cwd)
    }

    #[test]
    fn test_main_worktree_disabled_ignores() {
        let result = check("Write", &json!({"file_path": "/w/a.txt"}), &main_context());
        assert_eq!(result.permission, Permission::Ignore);
    }

    #[test]
    fn test_always_deny_beats_table_allow() {
        let result = check("Bash", &bash("sudo ls"), &feat_context());
        assert_eq!(result.permission, Permission::Deny);
        assert_eq!(result.matched_pattern.as_deref(), Some("Bash(sudo:*)"));
        assert!(result.decision_reason().starts_with("[Bash(sudo:*)]"));
    }

    #[test]
    fn test_always_allow() {
        let result = check("Read", &json!({"file_path": "/etc/passwd"}), &feat_context());
        assert_eq!(result.permission, Permission::Allow);
    }

    #[test]
    fn test_table_most_restrictive_match_wins() {
        // Both Bash(git:*) → allow and Bash(git push:*) → ask match; ask is
        // more restrictive and wins regardless of declaration order
        let result = check("Bash", &bash("git push origin main"), &feat_context());
        assert_eq!(result.permission, Permission::Ask);
        assert_eq!(result.matched_pattern.as_deref(), Some("Bash(git push:*)"));
        assert_eq!(
            result.decision_reason(),
            "[Bash(git push:*)] Feature branch policy"
        );
    }

    #[test]
    fn test_table_miss_uses_default_permission() {
        let result = check("Bash", &bash("cargo build"), &feat_context());
        assert_eq!(result.permission, Permission::Ask);
        assert!(result.reason.contains("default permission"));
        assert_eq!(result.matched_pattern, None);
    }

    #[test]
    fn test_chain_returns_most_restrictive() {
        let result = check(
            "Bash",
            &bash("git add . && git push -f origin main"),
            &feat_context(),
        );
        assert_eq!(result.permission, Permission::Ask);
        assert_eq!(result.matched_pattern.as_deref(), Some("Bash(git push:*)"));
    }

    #[test]
    fn test_cd_outside_boundary_denied() {
        let result = check("Bash", &bash("cd /etc && ls"), &feat_context());
        assert_eq!(result.permission, Permission::Deny);
        assert!(result.reason.contains("boundary"));
    }

    #[test]
    fn test_cd_inside_boundary_allowed() {
        let result = check("Bash", &bash("cd src"), &feat_context());
        assert_eq!(result.permission, Permission::Allow);
    }

    #[test]
    fn test_boundary_denies_write_outside_worktree() {
        let result = check("Write", &json!({"file_path": "/etc/motd"}), &feat_context());
        assert_eq!(result.permission, Permission::Deny);
        assert!(result.reason.contains("boundary"));
    }

    #[test]
    fn test_boundary_exempts_read() {
        // Read outside the worktree: always_allow fires before any boundary
        // logic, and Read is exempt from boundary checks anyway
        let result = check("Read", &json!({"file_path": "/etc/motd"}), &feat_context());
        assert_eq!(result.permission, Permission::Allow);
    }

    #[test]
    fn test_unknown_branch_fallback() {
        let mut context = feat_context();
        context.branch_type = Some("wip".into());
        let result = check("Bash", &bash("rm -rf ./x"), &context);
        assert_eq!(result.permission, Permission::Deny);
        assert_eq!(result.matched_pattern.as_deref(), Some("Bash(rm:*)"));
        assert_eq!(result.reason, "Unknown branch type");
    }
}
