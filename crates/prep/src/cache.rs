//! Disk-backed pipeline cache
//!
//! A cache file holds the complete serialized record batch of one pipeline
//! run. Its presence alone decides whether the next run recomputes. Writes go
//! through a temp file in the same directory and an atomic rename, so a
//! failed or interrupted run never leaves a partial artifact behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{PrepError, Result};

/// Hex characters of the fingerprint kept in the file name.
pub const FINGERPRINT_LEN: usize = 16;

/// How cache files are keyed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// One file per variant; parameters are ignored once it exists.
    Fixed,
    /// One file per variant and parameter fingerprint.
    #[default]
    Fingerprint,
    /// Always recompute, never write.
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub mode: CacheMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir().join("creditprep"),
            mode: CacheMode::default(),
        }
    }
}

impl CacheConfig {
    /// Cache file for `variant`, or `None` when caching is off.
    pub fn path_for(&self, variant: &str, fingerprint: &str) -> Option<PathBuf> {
        match self.mode {
            CacheMode::Off => None,
            CacheMode::Fixed => Some(self.dir.join(format!("{}.pb", variant))),
            CacheMode::Fingerprint => {
                let short = &fingerprint[..fingerprint.len().min(FINGERPRINT_LEN)];
                Some(self.dir.join(format!("{}-{}.pb", variant, short)))
            }
        }
    }
}

/// BLAKE3 over the canonical JSON form of `key`, hex encoded.
///
/// `serde_json` maps are ordered, so object keys come out sorted and the
/// digest does not depend on field declaration order.
pub fn fingerprint<T: Serialize>(key: &T) -> Result<String> {
    let value = serde_json::to_value(key)
        .map_err(|e| PrepError::Serialization(format!("cache key: {}", e)))?;
    let canonical = serde_json::to_string(&value)
        .map_err(|e| PrepError::Serialization(format!("cache key: {}", e)))?;
    Ok(hex::encode(blake3::hash(canonical.as_bytes()).as_bytes()))
}

/// Bytes returned by [`run_with_cache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached {
    pub bytes: Vec<u8>,
    /// True when the bytes came from an existing cache file.
    pub hit: bool,
}

/// Return the cached bytes at `path` if present, otherwise run `compute`
/// and persist its output. With no path, always computes.
pub fn run_with_cache<F>(path: Option<&Path>, compute: F) -> Result<Cached>
where
    F: FnOnce() -> Result<Vec<u8>>,
{
    let Some(path) = path else {
        debug!("cache disabled, computing");
        return Ok(Cached {
            bytes: compute()?,
            hit: false,
        });
    };

    if path.is_file() {
        info!("Cache hit: {}", path.display());
        return Ok(Cached {
            bytes: fs::read(path)?,
            hit: true,
        });
    }

    info!("Cache miss: {}", path.display());
    let bytes = compute()?;
    persist(path, &bytes)?;
    info!("Cached {} bytes at {}", bytes.len(), path.display());
    Ok(Cached { bytes, hit: false })
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
