//! Tool-identifier pattern matching
//!
//! Permission tables key their entries by tool identifier:
//!
//! - `ToolName`: exact match on the tool name
//! - `Bash(prefix:*)`: any Bash invocation whose command starts with
//!   `prefix`
//! - `Bash(literal)`: exact match on the Bash command

use serde_json::Value;

/// Check whether a tool call matches a permission pattern
pub fn matches_tool_pattern(pattern: &str, tool_name: &str, tool_input: Option<&Value>) -> bool {
    if pattern == tool_name {
        return true;
    }

    if let Some(inner) = pattern
        .strip_prefix("Bash(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        if tool_name != "Bash" {
            return false;
        }
        let command = tool_input
            .and_then(|input| input.get("command"))
            .and_then(Value::as_str)
            .unwrap_or("");

        return match inner.strip_suffix(":*") {
            Some(prefix) => command.starts_with(prefix),
            None => command == inner,
        };
    }

    false
}

/// Format a tool call into its canonical identifier
///
/// Bash commands identify by their first two words (`Bash(git push:*)`),
/// single-word commands by the word alone (`Bash(ls:*)`); every other tool
/// identifies by its bare name.
pub fn format_tool_identifier(tool_name: &str, tool_input: Option<&Value>) -> String {
    if tool_name != "Bash" {
        return tool_name.to_string();
    }

    let command = tool_input
        .and_then(|input| input.get("command"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let words: Vec<&str> = command.split_whitespace().take(2).collect();

    if words.is_empty() {
        "Bash".to_string()
    } else {
        format!("Bash({}:*)", words.join(" "))
    }
}

/// Check whether one tool identifier matches a permission pattern
///
/// Used where the caller has already formatted an identifier: exact match,
/// `prefix:*` wildcard, and base-command prefix matching between two Bash
/// identifiers (`Bash(git:*)` covers `Bash(git status:*)`).
pub fn identifier_matches_pattern(identifier: &str, pattern: &str) -> bool {
    if identifier == pattern {
        return true;
    }

    if let Some(prefix) = pattern.strip_suffix(":*)").map(|p| p.to_string() + ")")
        && let (Some(id_cmd), Some(pat_cmd)) = (bash_command_part(identifier), bash_command_part(&prefix))
    {
        return id_cmd.starts_with(&pat_cmd);
    }

    if let Some(prefix) = pattern.strip_suffix(":*") {
        return identifier.starts_with(prefix);
    }

    false
}

/// The command part of a `Bash(...)` identifier, without any `:*` suffix
fn bash_command_part(identifier: &str) -> Option<String> {
    let inner = identifier
        .strip_prefix("Bash(")
        .and_then(|rest| rest.strip_suffix(')'))?;
    Some(inner.strip_suffix(":*").unwrap_or(inner).to_string())
}
