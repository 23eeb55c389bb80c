//! Command semantics extraction for shell-execution events.
//!
//! Tokenization uses POSIX shell-word splitting via `shell-words`. The
//! derived facts are heuristic by design: quoting tricks, command
//! substitution, and nested shells are not analyzed, and a command that
//! fails to tokenize yields empty facts. Extraction never fails the
//! overall evaluation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Delegation entry points whose invocation always passes the gate.
pub const DELEGATION_COMMANDS: &[&str] =
    &["cask", "oask", "gask", "cask-w", "oask-w", "gask-w"];

const GIT_READONLY: &[&str] = &["status", "log", "diff", "show"];
const GIT_MUTATING: &[&str] = &["add", "commit", "push", "merge", "rebase", "reset"];
const PIPELINE_BREAKS: &[&str] = &["|", ";", "&&", "||"];

/// Output redirection forms: `>`, `>>`, numbered (`2>`), and `&`-prefixed
/// (`&>`, `&>>`), excluding a target immediately preceded by a quote.
/// Longest alternatives first so `>>` captures the real target.
static REDIRECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^"])(?:&>>|&>|>>|\d?>)\s*([^\s;|&]+)"#).expect("redirect pattern")
});

/// Classification of a `git <subcommand>` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GitClass {
    /// Not a git invocation at all.
    #[default]
    None,
    ReadOnly,
    Mutating,
    /// A git subcommand outside both fixed sets.
    Other,
}

/// Facts derived from one shell command line.
#[derive(Debug, Clone, Default)]
pub struct CommandFacts {
    pub tokens: Vec<String>,
    pub is_delegation: bool,
    pub git: GitClass,
    /// Candidate paths the command would write to, unresolved.
    pub write_targets: Vec<String>,
}

impl CommandFacts {
    pub fn from_command(command: &str) -> Self {
        // A command that does not tokenize yields no facts at all; the
        // raw-text redirect scan is skipped too.
        let Ok(tokens) = shell_words::split(command) else {
            return Self::default();
        };

        let is_delegation = tokens
            .first()
            .map(|first| DELEGATION_COMMANDS.contains(&first.to_ascii_lowercase().as_str()))
            .unwrap_or(false);

        let mut write_targets = redirect_targets(command);
        write_targets.extend(tee_targets(&tokens));
        write_targets.extend(sed_in_place_targets(&tokens));
        write_targets.extend(rm_targets(&tokens));
        if let Some(dest) = copy_move_dest(&tokens) {
            write_targets.push(dest);
        }

        Self {
            git: classify_git(&tokens),
            tokens,
            is_delegation,
            write_targets,
        }
    }
}

fn classify_git(tokens: &[String]) -> GitClass {
    if tokens.len() < 2 || tokens[0] != "git" {
        return GitClass::None;
    }
    let subcommand = tokens[1].as_str();
    if GIT_READONLY.contains(&subcommand) {
        GitClass::ReadOnly
    } else if GIT_MUTATING.contains(&subcommand) {
        GitClass::Mutating
    } else {
        GitClass::Other
    }
}

fn redirect_targets(command: &str) -> Vec<String> {
    REDIRECT_RE
        .captures_iter(command)
        .filter_map(|captures| captures.get(1))
        .map(|target| target.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
        .collect()
}

/// Arguments following each `tee` token up to the next pipeline separator,
/// excluding flag-like arguments.
fn tee_targets(tokens: &[String]) -> Vec<String> {
    let mut targets = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] != "tee" {
            i += 1;
            continue;
        }
        i += 1;
        while i < tokens.len() && tokens[i].starts_with('-') {
            i += 1;
        }
        while i < tokens.len() && !PIPELINE_BREAKS.contains(&tokens[i].as_str()) {
            if !tokens[i].is_empty() && !tokens[i].starts_with('-') {
                targets.push(tokens[i].clone());
            }
            i += 1;
        }
    }
    targets
}

/// `sed`/`gsed` with an in-place flag edits its final non-flag argument.
fn sed_in_place_targets(tokens: &[String]) -> Vec<String> {
    match tokens.first().map(String::as_str) {
        Some("sed") | Some("gsed") => {}
        _ => return Vec::new(),
    }
    if !tokens[1..].iter().any(|token| token.starts_with("-i")) {
        return Vec::new();
    }
    tokens[1..]
        .iter()
        .filter(|token| !token.is_empty() && !token.starts_with('-'))
        .next_back()
        .map(|target| vec![target.clone()])
        .unwrap_or_default()
}

fn rm_targets(tokens: &[String]) -> Vec<String> {
    if tokens.first().map(String::as_str) != Some("rm") {
        return Vec::new();
    }
    tokens[1..]
        .iter()
        .filter(|token| !token.is_empty() && !token.starts_with('-'))
        .cloned()
        .collect()
}

/// `cp`/`mv` with at least two non-flag arguments writes to the last one.
fn copy_move_dest(tokens: &[String]) -> Option<String> {
    match tokens.first().map(String::as_str) {
        Some("cp") | Some("mv") => {}
        _ => return None,
    }
    let args: Vec<&String> = tokens[1..]
        .iter()
        .filter(|token| !token.is_empty() && !token.starts_with('-'))
        .collect();
    if args.len() >= 2 {
        Some(args[args.len() - 1].clone())
    } else {
        None
    }
}
