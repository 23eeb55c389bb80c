//! Path discovery and containment checks for the gate.
//!
//! Everything here is best-effort: a path that cannot be resolved against
//! the filesystem is normalized lexically instead, and missing platform
//! directories simply shrink the whitelist.

use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

/// Directory names that mark a repository root.
const ROOT_MARKERS: &[&str] = &[".autoflow", ".claude", ".git"];

/// Walk from `start` upward and return the nearest ancestor containing a
/// recognized project marker directory. Falls back to `start` itself.
pub fn find_repo_root(start: &Path) -> PathBuf {
    let start = canonicalize_lenient(start);
    for dir in start.ancestors() {
        for marker in ROOT_MARKERS {
            if dir.join(marker).is_dir() {
                return dir.to_path_buf();
            }
        }
    }
    start
}

/// User configuration directory, honoring `XDG_CONFIG_HOME` as an override.
pub fn config_home() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return expand_tilde(xdg.trim());
        }
    }
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(".config"),
        None => PathBuf::from(".config"),
    }
}

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Resolve a raw target string to an absolute path relative to `cwd`.
/// Returns `None` for blank input; never fails on unresolvable paths.
pub fn normalize_target(raw: &str, cwd: &Path) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut path = expand_tilde(raw);
    if path.is_relative() {
        path = cwd.join(path);
    }
    Some(canonicalize_lenient(&path))
}

pub fn is_under(path: &Path, base: &Path) -> bool {
    path.starts_with(base)
}

fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Canonicalize when the path exists; otherwise fold `.` and `..`
/// components lexically so containment checks still work.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => clean_lexically(path),
    }
}

fn clean_lexically(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Locations exempt from repository-boundary write checks.
#[derive(Debug, Clone)]
pub struct Whitelist {
    bases: Vec<PathBuf>,
}

impl Whitelist {
    /// The standard exemptions: the user's stored-plans directory, the
    /// platform temp directory, and the repository control directory.
    pub fn standard(repo_root: &Path) -> Self {
        let mut bases = Vec::new();
        if let Some(home) = home_dir() {
            bases.push(home.join(".claude").join("plans"));
        }
        bases.push(std::env::temp_dir());
        bases.push(repo_root.join(".autoflow"));
        Self {
            bases: bases.iter().map(|b| canonicalize_lenient(b)).collect(),
        }
    }

    pub fn from_bases(bases: Vec<PathBuf>) -> Self {
        Self { bases }
    }

    pub fn contains(&self, target: &Path) -> bool {
        self.bases.iter().any(|base| is_under(target, base))
    }
}
