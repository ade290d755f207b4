//! Structural validation of the security rules document
//!
//! Run at session start (`validate_only` mode) so broken rules surface
//! before any tool call is judged against them. Validation collects every
//! problem it finds instead of stopping at the first.

use crate::security::rules::{RuleGroup, RuleList, SecurityRules};

/// Tools a rule may name in its `tools` restriction
pub const VALID_TOOLS: &[&str] = &["Read", "Write", "Edit", "MultiEdit", "NotebookEdit", "Bash"];

/// Validate the rules document, returning all problems found
pub fn validate_security_rules(rules: &SecurityRules) -> Vec<String> {
    let mut errors = Vec::new();
    validate_list(&rules.whitelist, "whitelist", &mut errors);
    validate_list(&rules.blacklist, "blacklist", &mut errors);
    errors
}

fn validate_list(list: &RuleList, list_name: &str, errors: &mut Vec<String>) {
    for (permission, group) in [
        ("deny", &list.deny),
        ("ask", &list.ask),
        ("allow", &list.allow),
    ] {
        validate_group(group, &format!("{list_name}.{permission}"), errors);
    }
}

fn validate_group(group: &RuleGroup, location: &str, errors: &mut Vec<String>) {
    for (index, rule) in group.files.iter().enumerate() {
        let at = format!("{location}.files[{index}]");
        if rule.pattern.is_empty() {
            errors.push(format!("{at}: 'pattern' must not be empty"));
        }
        validate_tools(&rule.tools, &at, errors);
    }

    for (index, rule) in group.commands.iter().enumerate() {
        let at = format!("{location}.commands[{index}]");
        if rule.command.is_empty() {
            errors.push(format!("{at}: 'command' must not be empty"));
        }
        if let Err(e) = rule.compiled_patterns() {
            errors.push(format!("{at}: {e}"));
        }
        for (group_index, flag_group) in rule.flags.iter().enumerate() {
            if flag_group.is_empty() {
                errors.push(format!("{at}.flags[{group_index}]: empty flag conjunction"));
            }
        }
        validate_tools(&rule.tools, &at, errors);
    }
}

fn validate_tools(tools: &[String], location: &str, errors: &mut Vec<String>) {
    for tool in tools {
        if !VALID_TOOLS.iter().any(|valid| valid == tool) {
            errors.push(format!(
                "{location}: unknown tool '{tool}' (expected one of: {})",
                VALID_TOOLS.join(", ")
            ));
        }
    }
}
