//! Task responses and the response-merge algebra
//!
//! Every task returns at most one [`TaskResponse`]; the dispatcher folds them
//! into a single [`AggregateResponse`] written to stdout. The merge is a
//! single pass over the ordered task results:
//!
//! - `continue` is false iff any task said false; `suppressOutput` is true
//!   iff any task said true
//! - the first non-empty `stopReason` wins; the first `decision: block` wins
//!   together with its own `reason`
//! - `systemMessage` is the task-labelled concatenation of all messages
//! - for PreToolUse, `hookSpecificOutput` carries the most restrictive
//!   permission across all tasks (`deny` > `ask` > `allow`); ties resolve to
//!   the later task, which makes configuration order meaningful

use crate::permission::PermissionDecision;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only `decision` value a task may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Block,
}

/// PreToolUse permission verdict carried in `hookSpecificOutput`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOutput {
    hook_event_name: String,
    pub permission_decision: PermissionDecision,
    pub permission_decision_reason: String,
}

impl PermissionOutput {
    pub fn new(decision: PermissionDecision, reason: impl Into<String>) -> Self {
        Self {
            hook_event_name: "PreToolUse".to_string(),
            permission_decision: decision,
            permission_decision_reason: reason.into(),
        }
    }

    /// True when this output belongs to the PreToolUse merge path
    pub fn is_pre_tool_use(&self) -> bool {
        self.hook_event_name == "PreToolUse"
    }
}

/// Event-specific output attached to a task response
///
/// PreToolUse verdicts get the typed representation the merger understands;
/// every other shape passes through as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookOutput {
    Permission(PermissionOutput),
    Other(Value),
}

impl HookOutput {
    pub fn permission(decision: PermissionDecision, reason: impl Into<String>) -> Self {
        HookOutput::Permission(PermissionOutput::new(decision, reason))
    }

    /// The PreToolUse verdict, if this output carries one
    pub fn as_permission(&self) -> Option<&PermissionOutput> {
        match self {
            HookOutput::Permission(p) if p.is_pre_tool_use() => Some(p),
            _ => None,
        }
    }
}

/// Structured result a task returns; all fields optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continue_: Option<bool>,

    #[serde(rename = "suppressOutput", skip_serializing_if = "Option::is_none")]
    pub suppress_output: Option<bool>,

    #[serde(rename = "stopReason", skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookOutput>,
}

impl TaskResponse {
    /// Response carrying only a system message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Response carrying a PreToolUse permission verdict
    pub fn with_permission(decision: PermissionDecision, reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: Some(HookOutput::permission(decision, reason)),
            ..Default::default()
        }
    }
}

/// Merged response written back to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    #[serde(rename = "continue")]
    pub continue_: bool,

    #[serde(rename = "suppressOutput")]
    pub suppress_output: bool,

    #[serde(rename = "stopReason", skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    #[serde(rename = "hookSpecificOutput", skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookOutput>,
}

impl Default for AggregateResponse {
    fn default() -> Self {
        Self {
            continue_: true,
            suppress_output: false,
            stop_reason: None,
            decision: None,
            reason: None,
            system_message: None,
            hook_specific_output: None,
        }
    }
}

impl AggregateResponse {
    /// Default-filled response carrying only a system message
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            system_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Combine ordered `(task_name, response)` pairs into one response
pub fn merge_task_responses(responses: &[(String, TaskResponse)]) -> AggregateResponse {
    let mut merged = AggregateResponse::default();
    let mut system_messages: Vec<String> = Vec::new();
    let mut permission_outputs: Vec<&PermissionOutput> = Vec::new();
    let mut other_outputs: Vec<(&str, &HookOutput)> = Vec::new();

    for (task_name, response) in responses {
        if response.continue_ == Some(false) {
            merged.continue_ = false;
        }

        if response.suppress_output == Some(true) {
            merged.suppress_output = true;
        }

        if merged.stop_reason.is_none()
            && let Some(stop_reason) = &response.stop_reason
            && !stop_reason.is_empty()
        {
            merged.stop_reason = Some(stop_reason.clone());
        }

        // The first blocking task wins; its own reason accompanies it
        if merged.decision.is_none() && response.decision == Some(Decision::Block) {
            merged.decision = Some(Decision::Block);
            merged.reason = response.reason.clone();
        }

        if let Some(message) = &response.system_message
            && !message.is_empty()
        {
            system_messages.push(format!("Task: '{task_name}'\nMessage: {message}"));
        }

        if let Some(output) = &response.hook_specific_output {
            match output.as_permission() {
                Some(permission) => permission_outputs.push(permission),
                None => other_outputs.push((task_name.as_str(), output)),
            }
        }
    }

    if !permission_outputs.is_empty() {
        // Most restrictive wins; `>=` makes the later task win ties
        let mut winner = permission_outputs[0];
        for &candidate in &permission_outputs[1..] {
            if candidate.permission_decision.rank() >= winner.permission_decision.rank() {
                winner = candidate;
            }
        }
        merged.hook_specific_output = Some(HookOutput::Permission(winner.clone()));
    } else if let Some((first_task, first_output)) = other_outputs.first() {
        merged.hook_specific_output = Some((*first_output).clone());
        if other_outputs.len() > 1 {
            let rest: Vec<&str> = other_outputs[1..].iter().map(|(name, _)| *name).collect();
            system_messages.push(format!(
                "Task: 'merge'\nMessage: Conflicting hookSpecificOutput values; \
                 kept '{first_task}', discarded: {}",
                rest.join(", ")
            ));
        }
    }

    if !system_messages.is_empty() {
        merged.system_message = Some(system_messages.join("\n\n"));
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn named(name: &str, response: TaskResponse) -> (String, TaskResponse) {
        (name.to_string(), response)
    }

    #[test]
    fn test_empty_merge_yields_defaults() {
        let merged = merge_task_responses(&[]);
        assert!(merged.continue_);
        assert!(!merged.suppress_output);
        assert!(merged.system_message.is_none());
        assert!(merged.hook_specific_output.is_none());
    }

    #[test]
    fn test_single_response_is_identity_after_default_fill() {
        let response = TaskResponse {
            continue_: Some(false),
            stop_reason: Some("rules broken".into()),
            system_message: Some("validation failed".into()),
            ..Default::default()
        };
        let merged = merge_task_responses(&[named("guard", response)]);
        assert!(!merged.continue_);
        assert_eq!(merged.stop_reason.as_deref(), Some("rules broken"));
        assert_eq!(
            merged.system_message.as_deref(),
            Some("Task: 'guard'\nMessage: validation failed")
        );
    }

    #[test]
    fn test_first_block_decision_wins_with_its_reason() {
        let first = TaskResponse {
            decision: Some(Decision::Block),
            reason: Some("first".into()),
            ..Default::default()
        };
        let second = TaskResponse {
            decision: Some(Decision::Block),
            reason: Some("second".into()),
            ..Default::default()
        };
        let merged = merge_task_responses(&[named("a", first), named("b", second)]);
        assert_eq!(merged.decision, Some(Decision::Block));
        assert_eq!(merged.reason.as_deref(), Some("first"));
    }

    #[test]
    fn test_most_restrictive_permission_wins() {
        let allow = TaskResponse::with_permission(PermissionDecision::Allow, "fine");
        let deny = TaskResponse::with_permission(PermissionDecision::Deny, "blocked");
        let ask = TaskResponse::with_permission(PermissionDecision::Ask, "confirm");

        let merged = merge_task_responses(&[
            named("a", allow),
            named("b", deny),
            named("c", ask),
        ]);
        let output = merged.hook_specific_output.unwrap();
        let permission = output.as_permission().unwrap();
        assert_eq!(permission.permission_decision, PermissionDecision::Deny);
        assert_eq!(permission.permission_decision_reason, "blocked");
    }

    #[test]
    fn test_permission_ties_resolve_to_later_task() {
        let first = TaskResponse::with_permission(PermissionDecision::Ask, "first asker");
        let second = TaskResponse::with_permission(PermissionDecision::Ask, "second asker");
        let merged = merge_task_responses(&[named("a", first), named("b", second)]);
        let output = merged.hook_specific_output.unwrap();
        assert_eq!(
            output.as_permission().unwrap().permission_decision_reason,
            "second asker"
        );
    }

    #[test]
    fn test_system_messages_are_labelled_and_joined() {
        let merged = merge_task_responses(&[
            named("log", TaskResponse::with_message("logged")),
            named("tts", TaskResponse::with_message("spoke")),
        ]);
        assert_eq!(
            merged.system_message.as_deref(),
            Some("Task: 'log'\nMessage: logged\n\nTask: 'tts'\nMessage: spoke")
        );
    }

    #[test]
    fn test_conflicting_non_permission_outputs_keep_first() {
        let a = TaskResponse {
            hook_specific_output: Some(HookOutput::Other(serde_json::json!({
                "hookEventName": "SessionStart",
                "additionalContext": "alpha"
            }))),
            ..Default::default()
        };
        let b = TaskResponse {
            hook_specific_output: Some(HookOutput::Other(serde_json::json!({
                "hookEventName": "SessionStart",
                "additionalContext": "beta"
            }))),
            ..Default::default()
        };
        let merged = merge_task_responses(&[named("a", a.clone()), named("b", b)]);
        assert_eq!(merged.hook_specific_output, a.hook_specific_output);
        assert!(merged.system_message.unwrap().contains("Conflicting"));
    }

    #[test]
    fn test_response_wire_shape() {
        let response = TaskResponse::with_permission(PermissionDecision::Deny, "[.env] blocked");
        let raw = serde_json::to_value(&response).unwrap();
        assert_eq!(raw["hookSpecificOutput"]["hookEventName"], "PreToolUse");
        assert_eq!(raw["hookSpecificOutput"]["permissionDecision"], "deny");
        assert_eq!(
            raw["hookSpecificOutput"]["permissionDecisionReason"],
            "[.env] blocked"
        );
    }

    prop_compose! {
        fn arb_decision()(choice in 0..3u8) -> PermissionDecision {
            match choice {
                0 => PermissionDecision::Allow,
                1 => PermissionDecision::Ask,
                _ => PermissionDecision::Deny,
            }
        }
    }

    prop_compose! {
        fn arb_response()(
            continue_ in proptest::option::of(any::<bool>()),
            suppress in proptest::option::of(any::<bool>()),
            verdict in proptest::option::of(arb_decision()),
        ) -> TaskResponse {
            TaskResponse {
                continue_,
                suppress_output: suppress,
                hook_specific_output: verdict
                    .map(|d| HookOutput::permission(d, d.as_str().to_string())),
                ..Default::default()
            }
        }
    }

    proptest! {
        #[test]
        fn prop_continue_false_iff_any_task_said_false(
            responses in proptest::collection::vec(arb_response(), 0..8)
        ) {
            let pairs: Vec<_> = responses
                .iter()
                .enumerate()
                .map(|(i, r)| (format!("t{i}"), r.clone()))
                .collect();
            let merged = merge_task_responses(&pairs);
            let any_false = responses.iter().any(|r| r.continue_ == Some(false));
            prop_assert_eq!(merged.continue_, !any_false);

            let any_suppress = responses.iter().any(|r| r.suppress_output == Some(true));
            prop_assert_eq!(merged.suppress_output, any_suppress);
        }

        #[test]
        fn prop_merged_permission_is_maximum_with_later_tiebreak(
            responses in proptest::collection::vec(arb_response(), 1..8)
        ) {
            // Tag each verdict's reason with its task index so the tie-break
            // winner is observable
            let pairs: Vec<_> = responses
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let mut tagged = r.clone();
                    if let Some(HookOutput::Permission(p)) = &mut tagged.hook_specific_output {
                        p.permission_decision_reason = format!("t{i}");
                    }
                    (format!("t{i}"), tagged)
                })
                .collect();
            let merged = merge_task_responses(&pairs);

            let verdicts: Vec<(usize, PermissionDecision)> = responses
                .iter()
                .enumerate()
                .filter_map(|(i, r)| {
                    r.hook_specific_output
                        .as_ref()
                        .and_then(HookOutput::as_permission)
                        .map(|p| (i, p.permission_decision))
                })
                .collect();

            match verdicts.iter().map(|(_, d)| d.rank()).max() {
                None => prop_assert!(merged.hook_specific_output.is_none()),
                Some(max_rank) => {
                    let expected_winner = verdicts
                        .iter()
                        .rev()
                        .find(|(_, d)| d.rank() == max_rank)
                        .unwrap();
                    let output = merged.hook_specific_output.unwrap();
                    let permission = output.as_permission().unwrap();
                    prop_assert_eq!(permission.permission_decision, expected_winner.1);
                    prop_assert_eq!(
                        permission.permission_decision_reason.clone(),
                        format!("t{}", expected_winner.0)
                    );
                }
            }
        }
    }
}
