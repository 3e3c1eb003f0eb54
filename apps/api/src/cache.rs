//! Content-addressed artifact cache.
//!
//! Maps a SHA-256 fingerprint of the generating inputs to a previously
//! computed text artifact so the model is queried only once per unique input.
//! Layout under the cache root:
//! - `plans/{fingerprint}.txt`   — raw plan replies, stored verbatim
//! - `html/{fingerprint}.html`   — final generated documents
//! - `parsed/{fingerprint}.json` — normalized resume records
//!
//! Writes are whole-file replacements; a miss is `None`, never an error.
//! No eviction — entries persist indefinitely, which grows unbounded.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Separator inserted between fingerprint inputs so that distinct logical
/// inputs (e.g. resume text vs. resume text + plan) cannot collide by
/// concatenation.
const FINGERPRINT_SEPARATOR: &str = "||PLAN||";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Plan,
    Html,
    Parsed,
}

impl ArtifactKind {
    fn dir(self) -> &'static str {
        match self {
            ArtifactKind::Plan => "plans",
            ArtifactKind::Html => "html",
            ArtifactKind::Parsed => "parsed",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Plan => "txt",
            ArtifactKind::Html => "html",
            ArtifactKind::Parsed => "json",
        }
    }
}

/// Filesystem-backed cache keyed by fingerprint.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Opens the cache, creating the root and per-kind directories.
    /// Directory creation happens here, at startup — never at module load.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for kind in [ArtifactKind::Plan, ArtifactKind::Html, ArtifactKind::Parsed] {
            let dir = root.join(kind.dir());
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        }
        Ok(Self { root })
    }

    pub fn get(&self, kind: ArtifactKind, fingerprint: &str) -> Option<String> {
        fs::read_to_string(self.path_for(kind, fingerprint)).ok()
    }

    /// Whole-file write. Failures are logged and swallowed: a writable cache
    /// directory is an environment precondition, and a missed write only
    /// costs a redundant model call later.
    pub fn put(&self, kind: ArtifactKind, fingerprint: &str, artifact: &str) {
        let path = self.path_for(kind, fingerprint);
        if let Err(e) = fs::write(&path, artifact) {
            warn!("Failed to write cache entry {}: {e}", path.display());
        }
    }

    fn path_for(&self, kind: ArtifactKind, fingerprint: &str) -> PathBuf {
        self.root
            .join(kind.dir())
            .join(format!("{fingerprint}.{}", kind.extension()))
    }
}

/// Computes a deterministic cache key over one or more input strings.
/// Inputs are separated by an explicit token before hashing.
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(FINGERPRINT_SEPARATOR.as_bytes());
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
