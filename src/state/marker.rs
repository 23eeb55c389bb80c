//! Context-emission markers.
//!
//! The gate emits its roles context payload at most once per
//! (repository, configuration signature) pair. The marker recording that
//! emission is a plain file in the temp directory; all marker I/O is
//! best-effort and errs toward emitting again rather than failing the
//! invocation.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

/// Storage seam for the emission marker, fakeable in tests.
pub trait EmissionStore {
    fn has_emitted(&self, key: &str) -> bool;
    fn mark_emitted(&self, key: &str);
}

/// Marker identity for one (repo root, config signature) pair.
pub fn marker_key(repo_root: &Path, signature: &str) -> String {
    let digest = Sha256::digest(repo_root.to_string_lossy().as_bytes());
    format!("cca-gate.{}.{}.marker", &hex::encode(digest)[..12], signature)
}

/// Marker files in the platform temp directory.
#[derive(Debug, Clone)]
pub struct TempDirMarkerStore {
    dir: PathBuf,
}

impl TempDirMarkerStore {
    pub fn new() -> Self {
        Self {
            dir: std::env::temp_dir(),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }
}

impl Default for TempDirMarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmissionStore for TempDirMarkerStore {
    fn has_emitted(&self, key: &str) -> bool {
        self.dir.join(key).exists()
    }

    fn mark_emitted(&self, key: &str) {
        if let Err(error) = fs::write(self.dir.join(key), "ok\n") {
            debug!(%error, key, "marker write failed");
        }
    }
}

/// In-memory store for engine tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    seen: std::cell::RefCell<std::collections::HashSet<String>>,
}

#[cfg(test)]
impl EmissionStore for MemoryStore {
    fn has_emitted(&self, key: &str) -> bool {
        self.seen.borrow().contains(key)
    }

    fn mark_emitted(&self, key: &str) {
        self.seen.borrow_mut().insert(key.to_string());
    }
}
