//! Layered role configuration resolution.
//!
//! Candidate sources are tried in specificity order and the first file that
//! parses as an object and passes the schema/enabled gate wins whole.
//! Resolution is read-only and never raises: missing, unreadable, or
//! malformed candidates are equivalent to "this source does not qualify".

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::roles::RolesConfig;
use crate::io::paths;
use crate::{GateError, Result};

/// Label used when no candidate source qualifies.
pub const DEFAULT_SOURCE: &str = "default";

/// Length of the hex-truncated configuration signature.
const SIGNATURE_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct RolesResolver {
    candidates: Vec<(PathBuf, &'static str)>,
}

impl RolesResolver {
    pub fn new(repo_root: &Path) -> Self {
        let autoflow = repo_root.join(".autoflow");
        Self::with_candidates(vec![
            (autoflow.join("roles.session.json"), "session"),
            (autoflow.join("roles.json"), "project"),
            (paths::config_home().join("cca").join("roles.json"), "system"),
        ])
    }

    pub(crate) fn with_candidates(candidates: Vec<(PathBuf, &'static str)>) -> Self {
        Self { candidates }
    }

    /// Return the first honored configuration plus a label identifying the
    /// winning source, or the built-in defaults labeled "default".
    pub fn resolve(&self) -> (RolesConfig, String) {
        for (path, label) in &self.candidates {
            let roles = match read_candidate(path) {
                Ok(roles) => roles,
                Err(error) => {
                    debug!(path = %path.display(), %error, "candidate does not qualify");
                    continue;
                }
            };
            if !roles.is_honored() {
                debug!(path = %path.display(), "candidate present but not honored");
                continue;
            }
            return (roles, format!("{label}:{}", path.display()));
        }
        (RolesConfig::default(), DEFAULT_SOURCE.to_string())
    }

    /// Fingerprint over each candidate's identity-and-freshness tuple.
    /// Changes iff any candidate's presence, mtime, or size changes; used
    /// purely for cache invalidation.
    pub fn signature(&self) -> String {
        let lines: Vec<String> = self
            .candidates
            .iter()
            .map(|(path, _)| freshness_line(path))
            .collect();
        let digest = Sha256::digest(lines.join("\n").as_bytes());
        hex::encode(digest)[..SIGNATURE_LEN].to_string()
    }
}

fn read_candidate(path: &Path) -> Result<RolesConfig> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    if !value.is_object() {
        return Err(GateError::Config(format!(
            "{} is not a JSON object",
            path.display()
        )));
    }
    Ok(serde_json::from_value(value)?)
}

fn freshness_line(path: &Path) -> String {
    match fs::metadata(path) {
        Ok(meta) => {
            let mtime_ns = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            format!("{}|{}|{}", path.display(), mtime_ns, meta.len())
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            format!("{}|missing", path.display())
        }
        Err(_) => format!("{}|error", path.display()),
    }
}
