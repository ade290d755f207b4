//! Security rule engine
//!
//! Evaluation order is fixed: the whitelist is consulted strictly before the
//! blacklist; within each list, `deny` before `ask` before `allow`; within
//! each permission group, file rules before command rules. The first rule to
//! fire decides.

pub mod command_match;
pub mod file_match;
pub mod rules;
pub mod validator;

pub use command_match::check_command_rules;
pub use file_match::{RuleMatch, check_file_rules, matches_file_pattern};
pub use rules::{CommandRule, FileRule, RuleGroup, RuleList, SecurityRules};
pub use validator::validate_security_rules;

use serde_json::Value;

/// Evaluate a tool call against the full rules document
pub fn evaluate(
    tool_name: &str,
    tool_input: Option<&Value>,
    rules: &SecurityRules,
) -> Option<RuleMatch> {
    for list in [&rules.whitelist, &rules.blacklist] {
        for (permission, group) in SecurityRules::groups_in_order(list) {
            if let Some(matched) =
                check_file_rules(tool_name, tool_input, &group.files, permission)
            {
                return Some(matched);
            }
            if let Some(matched) =
                check_command_rules(tool_name, tool_input, &group.commands, permission)
            {
                return Some(matched);
            }
        }
    }
    None
}
