// src/cache.rs

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// The three record collections a run snapshots between fetch and
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Events,
    Projects,
    Commits,
}

impl CacheKind {
    fn file_name(self) -> &'static str {
        match self {
            CacheKind::Events => "EXPORT_events.json",
            CacheKind::Projects => "EXPORT_projects.json",
            CacheKind::Commits => "EXPORT_commits.json",
        }
    }
}

/// On-disk snapshots of fetched collections, one pretty-printed JSON array
/// per kind. A present kind short-circuits that kind's remote fetch for the
/// whole run; remote pagination is the slow, rate-limited path and an
/// interrupted run should not pay for it twice.
pub struct ExportCache {
    dir: PathBuf,
}

impl ExportCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Rehydrates a snapshot if one exists. Missing, unreadable, or
    /// malformed files are a cache miss, never a failure; the run falls
    /// through to a live fetch.
    pub fn load<T: DeserializeOwned>(&self, kind: CacheKind) -> Option<Vec<T>> {
        let path = self.path(kind);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("unreadable cache file {}, refetching: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => {
                info!("found existing export {} ({} records)", path.display(), records.len());
                Some(records)
            }
            Err(e) => {
                warn!("corrupt cache file {}, refetching: {e}", path.display());
                None
            }
        }
    }

    /// Writes a snapshot, creating the cache dir on first use.
    pub fn save<T: Serialize>(&self, kind: CacheKind, records: &[T]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(kind);
        fs::write(&path, serde_json::to_string_pretty(records)?)?;
        info!("exported {} records to {}", records.len(), path.display());
        Ok(())
    }
}
