//! Role configuration schema.
//!
//! A roles file maps named responsibilities (executor, searcher,
//! git_manager, ...) to the agent identifier authorized for that class of
//! action. A file is honored only when it is a JSON object with
//! `schemaVersion == 1` and `enabled != false`; anything else is skipped
//! whole, never merged.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The only schema version the gate honors.
pub const SCHEMA_VERSION: i64 = 1;

/// The agent identity running behind this gate. Actions whose responsible
/// role resolves to a different identity are redirected to a delegate.
pub const SELF_ROLE: &str = "claude";

pub const DEFAULT_EXECUTOR: &str = "codex";
pub const DEFAULT_SEARCHER: &str = "claude";
pub const DEFAULT_GIT_MANAGER: &str = "codex";

/// A role bound to one agent, or an ordered preference list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RoleSpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RolesConfig {
    #[serde(rename = "schemaVersion", default)]
    pub schema_version: i64,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documenter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<RoleSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searcher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_manager: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub plan_mode_enforced: bool,

    /// Unrecognized keys, preserved so the context payload round-trips the
    /// winning file faithfully.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            enabled: true,
            executor: Some(DEFAULT_EXECUTOR.to_string()),
            reviewer: Some("codex".to_string()),
            documenter: Some("codex".to_string()),
            designer: Some(RoleSpec::Many(vec![
                "claude".to_string(),
                "codex".to_string(),
            ])),
            searcher: Some(DEFAULT_SEARCHER.to_string()),
            git_manager: Some(DEFAULT_GIT_MANAGER.to_string()),
            plan_mode_enforced: false,
            extra: BTreeMap::new(),
        }
    }
}

impl RolesConfig {
    /// Schema/enabled gate for candidate config sources.
    pub fn is_honored(&self) -> bool {
        self.schema_version == SCHEMA_VERSION && self.enabled
    }

    pub fn executor(&self) -> String {
        role_or(&self.executor, DEFAULT_EXECUTOR)
    }

    pub fn searcher(&self) -> String {
        role_or(&self.searcher, DEFAULT_SEARCHER)
    }

    pub fn git_manager(&self) -> String {
        role_or(&self.git_manager, DEFAULT_GIT_MANAGER)
    }
}

fn role_or(value: &Option<String>, default: &str) -> String {
    match value {
        Some(role) if !role.trim().is_empty() => role.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Uniform role normalization: trimmed, case-insensitive.
pub fn normalize_role(role: &str) -> String {
    role.trim().to_ascii_lowercase()
}

pub fn is_self_role(role: &str) -> bool {
    normalize_role(role) == SELF_ROLE
}
