//! Command rule matching for Bash tool calls
//!
//! Two phases run in order:
//!
//! **Phase A** tests every rule that carries regex patterns against the
//! original, unsplit command. This catches constructs like `curl ... | sh`
//! that disappear once the command is decomposed. A rule only participates
//! when its base command appears somewhere in the whitespace-normalised full
//! command; the regex alone is not enough.
//!
//! **Phase B** decomposes the command (chains, pipes, substitutions) and
//! tests each extracted command on its own. A rule fires when the command
//! starts with the rule's base and every configured condition group holds.

use crate::Permission;
use crate::security::file_match::RuleMatch;
use crate::security::rules::CommandRule;
use crate::shell::{contains_variable_reference, extract_all_commands};
use regex::Regex;
use serde_json::Value;

/// Check a tool call against command rules, returning the first match
pub fn check_command_rules(
    tool_name: &str,
    tool_input: Option<&Value>,
    rules: &[CommandRule],
    permission: Permission,
) -> Option<RuleMatch> {
    if tool_name != "Bash" || rules.is_empty() {
        return None;
    }
    let command = tool_input?.get("command")?.as_str()?;
    if command.is_empty() {
        return None;
    }

    // Phase A: full-command regex sweep, before any decomposition
    if let Some(matched) = check_full_command_patterns(command, rules, permission) {
        return Some(matched);
    }

    // Phase B: every extracted command against every rule
    for extracted in extract_all_commands(command) {
        if let Some(matched) = check_single_command(&extracted, rules, permission) {
            return Some(matched);
        }
    }

    None
}

fn check_full_command_patterns(
    command: &str,
    rules: &[CommandRule],
    permission: Permission,
) -> Option<RuleMatch> {
    let normalized = normalize(command);

    for rule in rules {
        if rule.patterns.is_empty() {
            continue;
        }

        let base = rule.command.to_lowercase();
        if !normalized.contains(&base) {
            continue;
        }

        // Regexes run against the original command to preserve case
        if matches_any_pattern(command, &rule.patterns) {
            return Some(rule_match(rule, permission));
        }
    }

    None
}

fn check_single_command(
    command: &str,
    rules: &[CommandRule],
    permission: Permission,
) -> Option<RuleMatch> {
    let normalized = normalize(command);

    for rule in rules {
        let base = rule.command.to_lowercase();
        if !normalized.starts_with(&base) {
            continue;
        }

        if rule.block_always {
            return Some(rule_match(rule, permission));
        }

        let has_conditions =
            !rule.flags.is_empty() || !rule.paths.is_empty() || !rule.patterns.is_empty();
        if !has_conditions {
            let message = rule
                .message
                .clone()
                .unwrap_or_else(|| format!("Command matched: {}", rule.command));
            return Some(RuleMatch {
                permission,
                message,
                matched: rule.command.clone(),
            });
        }

        // Empty condition groups hold trivially; configured groups must all
        // hold at once
        let flags_match = rule.flags.is_empty() || has_required_flags(&normalized, &rule.flags);
        let paths_match = rule.paths.is_empty() || has_listed_paths(command, &rule.paths);
        let patterns_match =
            rule.patterns.is_empty() || matches_any_pattern(command, &rule.patterns);

        if flags_match && paths_match && patterns_match {
            return Some(rule_match(rule, permission));
        }
    }

    None
}

fn rule_match(rule: &CommandRule, permission: Permission) -> RuleMatch {
    let message = rule
        .message
        .clone()
        .unwrap_or_else(|| format!("Dangerous command prevented for safety: {}", rule.command));
    RuleMatch {
        permission,
        message,
        matched: rule.command.clone(),
    }
}

/// Lowercase and collapse runs of whitespace to single spaces
fn normalize(command: &str) -> String {
    command
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// True when all flags of at least one conjunction appear as whole tokens
fn has_required_flags(normalized: &str, flag_groups: &[Vec<String>]) -> bool {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    flag_groups.iter().any(|group| {
        group
            .iter()
            .all(|flag| tokens.contains(&flag.to_lowercase().as_str()))
    })
}

/// True when a listed path appears as a whole token, or any non-flag token
/// carries a variable reference
///
/// Variables are never expanded; a reference could resolve to any of the
/// listed paths, so its mere presence satisfies the condition.
fn has_listed_paths(command: &str, paths: &[String]) -> bool {
    let tokens: Vec<&str> = command.split_whitespace().collect();

    for path in paths {
        let path_lower = path.to_lowercase();
        if tokens.iter().any(|token| token.to_lowercase() == path_lower) {
            return true;
        }
    }

    tokens
        .iter()
        .any(|token| !token.starts_with('-') && contains_variable_reference(token))
}

/// True when any regex in the list matches the command
fn matches_any_pattern(command: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(command))
            .unwrap_or(false)
    })
}
