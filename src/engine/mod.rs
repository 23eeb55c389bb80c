//! Policy decision engine.
//!
//! One [`Gate`] instance evaluates one intercepted tool action against the
//! resolved role configuration. Rules run in fixed precedence order; the
//! first match decides the tool-gating outcome. Context emission is a
//! separate step that always follows a non-deny verdict and is deduplicated
//! by the emission store. Unrecognized tool categories allow by default:
//! the rule set is an allow-list of risky categories, not a firewall.

pub mod command;
pub mod decision;
pub mod event;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::resolver::RolesResolver;
use crate::config::roles;
use crate::engine::command::{CommandFacts, GitClass};
use crate::engine::decision::{
    executor_block_message, git_manager_block_message, plan_mode_block_message,
    searcher_block_message, ContextPayload, Verdict,
};
use crate::engine::event::ToolEvent;
use crate::io::paths::{self, Whitelist};
use crate::state::marker::{marker_key, EmissionStore};

pub struct Gate<'a> {
    cwd: PathBuf,
    repo_root: PathBuf,
    whitelist: Whitelist,
    resolver: RolesResolver,
    store: &'a dyn EmissionStore,
}

impl<'a> Gate<'a> {
    pub fn new(
        cwd: PathBuf,
        repo_root: PathBuf,
        resolver: RolesResolver,
        store: &'a dyn EmissionStore,
    ) -> Self {
        let whitelist = Whitelist::standard(&repo_root);
        Self {
            cwd,
            repo_root,
            whitelist,
            resolver,
            store,
        }
    }

    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Evaluate one event to a terminal verdict.
    pub fn evaluate(&self, event: &ToolEvent) -> Verdict {
        if let Some(denied) = self.gate_tool(event) {
            debug!(tool = event.tool_name(), "denied");
            return denied;
        }
        self.context_verdict()
    }

    fn gate_tool(&self, event: &ToolEvent) -> Option<Verdict> {
        let tool = normalize_tool(event.tool_name());

        if is_plan_exit_tool(&tool) {
            let (roles, _) = self.resolver.resolve();
            if roles.plan_mode_enforced {
                return Some(deny(plan_mode_block_message()));
            }
            return None;
        }
        if is_search_tool(&tool) {
            let (roles, _) = self.resolver.resolve();
            let searcher = roles.searcher();
            if !roles::is_self_role(&searcher) {
                return Some(deny(searcher_block_message(&searcher)));
            }
            return None;
        }
        if is_readonly_tool(&tool) {
            return None;
        }
        if is_file_mod_tool(&tool) {
            return self.gate_file_modification(event);
        }
        if is_shell_tool(&tool) {
            return self.gate_shell(event);
        }
        None
    }

    fn gate_file_modification(&self, event: &ToolEvent) -> Option<Verdict> {
        let file_path = event.file_path()?;
        let target = paths::normalize_target(&file_path, &self.cwd)?;
        if !self.is_guarded(&target) {
            return None;
        }
        let (roles, _) = self.resolver.resolve();
        let executor = roles.executor();
        if roles::is_self_role(&executor) {
            return None;
        }
        Some(deny(executor_block_message(&executor)))
    }

    fn gate_shell(&self, event: &ToolEvent) -> Option<Verdict> {
        let command = event.command().unwrap_or_default();
        let facts = CommandFacts::from_command(&command);

        if facts.is_delegation {
            return None;
        }
        match facts.git {
            GitClass::ReadOnly => return None,
            GitClass::Mutating => {
                let (roles, _) = self.resolver.resolve();
                let git_manager = roles.git_manager();
                if roles::is_self_role(&git_manager) {
                    return None;
                }
                return Some(deny(git_manager_block_message(&git_manager)));
            }
            GitClass::None | GitClass::Other => {}
        }

        if !self.touches_repo(&facts.write_targets) {
            return None;
        }
        let (roles, _) = self.resolver.resolve();
        let executor = roles.executor();
        if roles::is_self_role(&executor) {
            return None;
        }
        Some(deny(executor_block_message(&executor)))
    }

    /// A target is guarded when it resolves inside the repository root and
    /// outside the whitelist.
    fn is_guarded(&self, target: &Path) -> bool {
        paths::is_under(target, &self.repo_root) && !self.whitelist.contains(target)
    }

    fn touches_repo(&self, targets: &[String]) -> bool {
        targets
            .iter()
            .filter_map(|raw| paths::normalize_target(raw, &self.cwd))
            .any(|target| self.is_guarded(&target))
    }

    /// Post-decision context step: emit the roles payload once per
    /// configuration signature, silently allow afterwards.
    fn context_verdict(&self) -> Verdict {
        let signature = self.resolver.signature();
        let key = marker_key(&self.repo_root, &signature);
        if self.store.has_emitted(&key) {
            return Verdict::AllowSilent;
        }
        self.store.mark_emitted(&key);
        let (roles, source) = self.resolver.resolve();
        Verdict::AllowWithContext(ContextPayload::new(
            source,
            self.repo_root.display().to_string(),
            roles,
        ))
    }
}

fn deny(reason: String) -> Verdict {
    Verdict::Deny { reason }
}

fn normalize_tool(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn is_plan_exit_tool(tool: &str) -> bool {
    matches!(tool.replace('_', "").as_str(), "exitplanmode" | "exitplan")
}

fn is_search_tool(tool: &str) -> bool {
    matches!(tool, "websearch" | "webfetch")
}

fn is_readonly_tool(tool: &str) -> bool {
    matches!(tool, "read" | "grep" | "glob" | "lsp")
}

fn is_file_mod_tool(tool: &str) -> bool {
    matches!(tool, "write" | "edit")
}

fn is_shell_tool(tool: &str) -> bool {
    tool == "bash"
}
