//! On-disk analysis cache: a versioned sidecar keyed by content hash
//! rather than mtime, so cache hits survive checkouts and CI runners that
//! don't preserve file timestamps.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::fnv1a_hash;

pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFileDigest {
    pub path: String,
    pub content_hash: u64,
    pub byte_len: u64,
}

impl SourceFileDigest {
    pub fn compute(path: &str, source: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            content_hash: fnv1a_hash(source),
            byte_len: source.len() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub cache_version: u32,
    pub generated_at: String,
    pub digests: Vec<SourceFileDigest>,
    pub payload: T,
}

impl<T> CacheEntry<T> {
    pub fn new(digests: Vec<SourceFileDigest>, payload: T, generated_at: impl Into<String>) -> Self {
        Self {
            cache_version: CACHE_VERSION,
            generated_at: generated_at.into(),
            digests,
            payload,
        }
    }

    /// Whether every digest in this entry still matches `current`. Any
    /// added, removed, or changed file invalidates the whole entry —
    /// there is no per-file partial reuse.
    pub fn is_fresh(&self, current: &[SourceFileDigest]) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }
        if self.digests.len() != current.len() {
            return false;
        }
        let mut mine: Vec<&SourceFileDigest> = self.digests.iter().collect();
        let mut theirs: Vec<&SourceFileDigest> = current.iter().collect();
        mine.sort_by(|a, b| a.path.cmp(&b.path));
        theirs.sort_by(|a, b| a.path.cmp(&b.path));
        mine.iter().zip(theirs.iter()).all(|(a, b)| {
            a.path == b.path && a.content_hash == b.content_hash && a.byte_len == b.byte_len
        })
    }
}

/// XDG-compliant cache root: `$XDG_CACHE_HOME/swa-engine`, falling back to
/// `~/.cache/swa-engine`, falling back to a temp directory.
pub fn cache_base_dir() -> PathBuf {
    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("swa-engine");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cache").join("swa-engine");
    }
    std::env::temp_dir().join("swa-engine")
}

/// Stable per-project cache key derived from the canonicalized project root,
/// not the git remote — this crate never shells out to git.
pub fn project_cache_key(project_root: &Path) -> String {
    let canonical = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    format!("{:016x}", fnv1a_hash(canonical.to_string_lossy().as_bytes()))
}

pub fn entry_path(project_root: &Path, name: &str) -> PathBuf {
    cache_base_dir()
        .join(project_cache_key(project_root))
        .join(format!("{name}.bin"))
}

pub fn load<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<CacheEntry<T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    match bincode::deserialize(&bytes) {
        Ok(entry) => Ok(Some(entry)),
        // A corrupt or version-mismatched cache file is not a fatal error —
        // callers just recompute and overwrite it.
        Err(_) => Ok(None),
    }
}

pub fn store<T: Serialize>(path: &Path, entry: &CacheEntry<T>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let bytes = bincode::serialize(entry).map_err(|e| Error::Io {
        path: path.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;
    fs::write(path, bytes).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}
