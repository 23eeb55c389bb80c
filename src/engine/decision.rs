//! Terminal verdicts and the machine-readable context payload.

use serde::{Deserialize, Serialize};

use crate::config::roles::{normalize_role, RolesConfig};

/// Fixed protocol marker prefixing the context line on stdout.
pub const PROTOCOL_MARKER: &str = "[CCA_ROLES_V1]";

/// Protocol identifier carried inside the payload.
pub const PROTOCOL_VERSION: &str = "cca.roles.v1";

/// Exit code signaling the caller to block the underlying action.
pub const DENY_EXIT_CODE: i32 = 2;

/// One line of structured output emitted on the first allow per
/// configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextPayload {
    pub proto: String,
    pub source: String,
    #[serde(rename = "repoRoot")]
    pub repo_root: String,
    pub roles: RolesConfig,
}

impl ContextPayload {
    pub fn new(source: String, repo_root: String, roles: RolesConfig) -> Self {
        Self {
            proto: PROTOCOL_VERSION.to_string(),
            source,
            repo_root,
            roles,
        }
    }

    /// Render the single-line stdout form: marker token plus compact JSON.
    pub fn render(&self) -> String {
        let body = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("{PROTOCOL_MARKER} {body}")
    }
}

/// Terminal state of one gate invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Allow; nothing on stdout.
    AllowSilent,
    /// Allow and emit the roles context payload.
    AllowWithContext(ContextPayload),
    /// Block the action with a remediation message on stderr.
    Deny { reason: String },
}

impl Verdict {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Verdict::Deny { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_blocking() {
            DENY_EXIT_CODE
        } else {
            0
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Deny { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Delegation alias for a role value: `opencode` delegates via `oask`,
/// `gemini` via `gask`, everything else via `cask`.
pub fn delegation_alias(role: &str) -> &'static str {
    match normalize_role(role).as_str() {
        "opencode" => "oask",
        "gemini" => "gask",
        _ => "cask",
    }
}

pub fn executor_block_message(executor: &str) -> String {
    format!(
        "File modification blocked. Use executor delegation:\n      - executor=codex: cask \"<task>\"\n      - executor=opencode: oask \"<task>\"\n      Current executor: {executor}\n"
    )
}

pub fn git_manager_block_message(git_manager: &str) -> String {
    let hint = delegation_alias(git_manager);
    format!(
        "Git operation blocked. Use git_manager delegation:\n      - git_manager={git_manager}: {hint} \"<task>\"\n      Current git_manager: {git_manager}\n"
    )
}

pub fn searcher_block_message(searcher: &str) -> String {
    format!(
        "Search blocked. Use searcher delegation: {}\n",
        delegation_alias(searcher)
    )
}

pub fn plan_mode_block_message() -> String {
    "ExitPlanMode blocked (plan_mode_enforced=true).\n\
     Use delegation: cask/oask/gask\n\
     To disable: set plan_mode_enforced=false in .autoflow/roles.json\n"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delegation_alias() {
        assert_eq!(delegation_alias("opencode"), "oask");
        assert_eq!(delegation_alias("Gemini"), "gask");
        assert_eq!(delegation_alias("codex"), "cask");
        assert_eq!(delegation_alias("anything-else"), "cask");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Verdict::AllowSilent.exit_code(), 0);
        assert_eq!(
            Verdict::AllowWithContext(ContextPayload::new(
                "default".to_string(),
                "/repo".to_string(),
                RolesConfig::default(),
            ))
            .exit_code(),
            0
        );
        assert_eq!(
            Verdict::Deny {
                reason: "no".to_string()
            }
            .exit_code(),
            2
        );
    }

    #[test]
    fn test_context_payload_renders_single_line() {
        let payload = ContextPayload::new(
            "default".to_string(),
            "/repo".to_string(),
            RolesConfig::default(),
        );
        let line = payload.render();
        assert!(line.starts_with("[CCA_ROLES_V1] {"));
        assert_eq!(line.lines().count(), 1);

        let body: serde_json::Value =
            serde_json::from_str(line.strip_prefix("[CCA_ROLES_V1] ").unwrap()).unwrap();
        assert_eq!(body["proto"], "cca.roles.v1");
        assert_eq!(body["repoRoot"], "/repo");
        assert_eq!(body["roles"]["executor"], "codex");
    }

    #[test]
    fn test_block_messages_name_roles_and_aliases() {
        let message = executor_block_message("codex");
        assert!(message.contains("Current executor: codex"));
        assert!(message.contains("cask"));

        let message = git_manager_block_message("opencode");
        assert!(message.contains("git_manager=opencode: oask"));

        let message = searcher_block_message("gemini");
        assert!(message.contains("gask"));

        let message = plan_mode_block_message();
        assert!(message.contains("plan_mode_enforced=false"));
    }
}
