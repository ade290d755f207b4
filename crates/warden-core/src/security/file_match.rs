//! Gitignore-style file pattern matching
//!
//! Patterns are matched case-insensitively against the tool's file path. A
//! pattern without a `/` is lifted to `**/pattern` so `secrets.json` matches
//! anywhere in the tree; for those simple basename patterns a suffix match on
//! the basename also counts, which handles paths like `my secrets.json`.

use crate::Permission;
use crate::event::ToolPayload;
use crate::security::rules::FileRule;
use crate::shell::{extract_paths_from_command, unquote};
use globset::GlobBuilder;
use serde_json::Value;

/// A fired rule: the permission it grants, its message, and what matched
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub permission: Permission,
    pub message: String,
    pub matched: String,
}

/// Check a tool call against file rules, returning the first match
///
/// Applies only to file-capable tools and `Bash`. For `Bash` the first
/// path-like token extracted from the command stands in for the file path.
pub fn check_file_rules(
    tool_name: &str,
    tool_input: Option<&Value>,
    rules: &[FileRule],
    permission: Permission,
) -> Option<RuleMatch> {
    if rules.is_empty() {
        return None;
    }

    let payload = ToolPayload::from_parts(tool_name, tool_input);
    let file_path = match payload {
        ToolPayload::File { file_path } => Some(file_path.to_string()),
        ToolPayload::Bash { command } => extract_file_from_bash(command),
        ToolPayload::Other => None,
    }?;

    for rule in rules {
        if !rule.tools.is_empty() && !rule.tools.iter().any(|t| t == tool_name) {
            continue;
        }

        if matches_file_pattern(&file_path, &rule.pattern) {
            let message = rule.message.clone().unwrap_or_else(|| {
                format!("Sensitive file access prevented for safety: {}", rule.pattern)
            });
            return Some(RuleMatch {
                permission,
                message,
                matched: rule.pattern.clone(),
            });
        }
    }

    None
}

/// Case-insensitive gitignore-style match of a path against one pattern
pub fn matches_file_pattern(file_path: &str, pattern: &str) -> bool {
    // A leading `!` marks whitelist intent at the rules level; the matcher
    // itself only sees the bare pattern
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);

    let path_lower = file_path.to_lowercase();
    let mut pattern_lower = pattern.to_lowercase();

    let is_basename_pattern = !pattern_lower.contains('/') && !pattern_lower.starts_with("**");
    if is_basename_pattern {
        pattern_lower = format!("**/{pattern_lower}");
    }

    let glob = match GlobBuilder::new(&pattern_lower)
        .literal_separator(true)
        .build()
    {
        Ok(glob) => glob,
        Err(_) => return false,
    };
    if glob.compile_matcher().is_match(&path_lower) {
        return true;
    }

    // Basename suffix match for simple patterns: "my secrets.json" should
    // still trip a "secrets.json" rule
    if is_basename_pattern {
        let basename = path_lower.rsplit('/').next().unwrap_or(&path_lower);
        let bare = pattern_lower.trim_start_matches("**/");
        if basename.ends_with(bare) {
            return true;
        }
    }

    false
}

/// Pull one candidate file path out of a bash command
fn extract_file_from_bash(command: &str) -> Option<String> {
    extract_paths_from_command(command)
        .into_iter()
        .next()
        .map(|path| unquote(&path))
}
