//! Command-line surface and per-invocation orchestration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::resolver::RolesResolver;
use crate::engine::decision::Verdict;
use crate::engine::event::{redact_env_value, ToolEvent};
use crate::engine::Gate;
use crate::io::paths;
use crate::io::stdin::read_stdin_with_timeout;
use crate::state::marker::TempDirMarkerStore;

/// Environment variable controlling diagnostic log filtering.
pub const LOG_ENV_VAR: &str = "CCA_GATE_LOG";

#[derive(Parser)]
#[command(name = "cca-gate")]
#[command(version)]
#[command(about = "Role delegation gate for Claude Code PreToolUse hooks")]
#[command(
    long_about = "cca-gate intercepts one tool invocation per run: it reads the hook event \
from stdin and/or environment variables, resolves the layered roles configuration, and \
exits 0 to allow (optionally printing a roles context line) or 2 to block the action."
)]
pub struct Cli {
    /// How long to wait for an event body on stdin, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub stdin_timeout_ms: u64,

    /// Force debug-level diagnostics on stderr
    #[arg(long)]
    pub debug: bool,
}

/// Initialize stderr diagnostics. Silent unless `--debug` or the log env
/// var asks otherwise; logging never alters the decision.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_env(LOG_ENV_VAR)
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// One gate invocation: ingest, decide, emit, exit code.
pub struct GateCommand {
    pub stdin_timeout_ms: u64,
}

impl GateCommand {
    pub fn new(stdin_timeout_ms: u64) -> Self {
        Self { stdin_timeout_ms }
    }

    pub fn execute(&self) -> i32 {
        let raw = read_stdin_with_timeout(Duration::from_millis(self.stdin_timeout_ms));
        debug!(stdin_len = raw.len(), "event body drained");
        log_hook_environment();

        let event = ToolEvent::from_process(&raw);
        debug!(tool = event.tool_name(), "normalized event");

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let repo_root = paths::find_repo_root(&cwd);
        let resolver = RolesResolver::new(&repo_root);
        let store = TempDirMarkerStore::new();
        let gate = Gate::new(cwd, repo_root, resolver, &store);

        let verdict = gate.evaluate(&event);
        match &verdict {
            Verdict::Deny { reason } => eprint!("{reason}"),
            Verdict::AllowWithContext(payload) => println!("{}", payload.render()),
            Verdict::AllowSilent => {}
        }
        verdict.exit_code()
    }
}

fn log_hook_environment() {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let mut vars: Vec<(String, String)> = std::env::vars()
        .filter(|(key, _)| {
            key.contains("CLAUDE") || key.contains("TOOL") || key.contains("ANTHROPIC")
        })
        .collect();
    vars.sort();
    for (key, value) in vars {
        debug!(var = %key, value = %redact_env_value(&key, &value), "hook environment");
    }
}
