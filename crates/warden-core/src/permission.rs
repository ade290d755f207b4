//! Permission verdicts and the most-restrictive calculus
//!
//! Two closely related types: [`PermissionDecision`] is the three-valued wire
//! verdict carried in `hookSpecificOutput`, while [`Permission`] adds the
//! internal `ignore` level used by permission tables (an `ignore` contributes
//! nothing to a merge and never reaches the wire).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display};

/// Wire-level permission verdict for PreToolUse decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Ask,
    Deny,
}

impl PermissionDecision {
    /// Restrictiveness rank: deny > ask > allow
    pub const fn rank(&self) -> u8 {
        match self {
            PermissionDecision::Allow => 1,
            PermissionDecision::Ask => 2,
            PermissionDecision::Deny => 3,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionDecision::Allow => "allow",
            PermissionDecision::Ask => "ask",
            PermissionDecision::Deny => "deny",
        }
    }
}

impl Display for PermissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Internal permission level used by permission tables
///
/// Parses case-insensitively: configuration files may spell levels `Ask`,
/// `ASK`, `ask`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Ignore,
    Allow,
    Ask,
    Deny,
}

impl Permission {
    /// Restrictiveness rank: deny > ask > allow > ignore
    pub const fn rank(&self) -> u8 {
        match self {
            Permission::Ignore => 0,
            Permission::Allow => 1,
            Permission::Ask => 2,
            Permission::Deny => 3,
        }
    }

    /// Fold two levels with the most-restrictive calculus; on equal rank the
    /// right-hand (later) operand wins.
    pub fn most_restrictive(self, later: Permission) -> Permission {
        if later.rank() >= self.rank() { later } else { self }
    }

    /// The wire verdict for this level, or `None` for `ignore`
    pub const fn decision(&self) -> Option<PermissionDecision> {
        match self {
            Permission::Ignore => None,
            Permission::Allow => Some(PermissionDecision::Allow),
            Permission::Ask => Some(PermissionDecision::Ask),
            Permission::Deny => Some(PermissionDecision::Deny),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::Ignore => "ignore",
            Permission::Allow => "allow",
            Permission::Ask => "ask",
            Permission::Deny => "deny",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Some(Permission::Ignore),
            "allow" => Some(Permission::Allow),
            "ask" => Some(Permission::Ask),
            "deny" => Some(Permission::Deny),
            _ => None,
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Permission::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid permission '{raw}' (expected allow, ask, deny, or ignore)"
            ))
        })
    }
}

impl From<PermissionDecision> for Permission {
    fn from(decision: PermissionDecision) -> Self {
        match decision {
            PermissionDecision::Allow => Permission::Allow,
            PermissionDecision::Ask => Permission::Ask,
            PermissionDecision::Deny => Permission::Deny,
        }
    }
}
