use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::manifest::types::{LatestVersions, ManifestSet};
use crate::version::error::CacheError;

const CACHE_FILE_PREFIX: &str = "cache-";
const CACHE_FILE_SUFFIX: &str = ".json";

/// A persisted snapshot of one run's fetched data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// When the entry was written; validity is measured from here
    pub timestamp: DateTime<Utc>,
    /// Calendar day (UTC) the entry belongs to
    pub date: NaiveDate,
    #[serde(rename = "packageJsons")]
    pub manifests: ManifestSet,
    pub latest_versions: LatestVersions,
}

/// Trait for storing and retrieving run snapshots
///
/// Every method is best effort: failures are logged and surface as a miss
/// or a no-op, never as an error.
#[cfg_attr(test, automock)]
pub trait SnapshotStorer: Send + Sync {
    /// Get the entry for a branch and repository set if still valid
    fn load(&self, branch: &str, repos: &[String]) -> Option<CacheEntry>;

    /// Store fetched data, replacing any entry under the same key
    fn save(
        &self,
        branch: &str,
        repos: &[String],
        manifests: &ManifestSet,
        latest_versions: &LatestVersions,
    );

    /// Remove entries whose file is older than the validity window
    ///
    /// Returns the number of removed entries.
    fn evict_expired(&self) -> usize;
}

/// Keep only the characters allowed in a cache file name
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// File name for a branch, repository set and day
///
/// Repositories are sorted first, so the call-site order does not matter.
pub fn cache_key(branch: &str, repos: &[String], date: NaiveDate) -> String {
    let mut sorted: Vec<&str> = repos.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    format!(
        "{}{}-{}-{}{}",
        CACHE_FILE_PREFIX,
        sanitize(branch),
        sanitize(&sorted.join("-")),
        date.format("%Y-%m-%d"),
        CACHE_FILE_SUFFIX
    )
}

fn is_cache_file(file_name: &str) -> bool {
    file_name.starts_with(CACHE_FILE_PREFIX) && file_name.ends_with(CACHE_FILE_SUFFIX)
}

/// JSON file cache living in a single directory
pub struct Cache {
    dir: PathBuf,
    validity: TimeDelta,
}

impl Cache {
    pub fn new(dir: &Path, validity: TimeDelta) -> Self {
        info!("Using cache directory {:?}", dir);
        Self {
            dir: dir.to_path_buf(),
            validity,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, branch: &str, repos: &[String], date: NaiveDate) -> PathBuf {
        self.dir.join(cache_key(branch, repos, date))
    }

    /// Read and validate the entry under today's key as of `now`
    pub fn load_at(
        &self,
        branch: &str,
        repos: &[String],
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(branch, repos, now.date_naive());

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache entry at {:?}", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_str(&content)?;
        let age = now - entry.timestamp;

        if age > self.validity {
            info!(
                "Cache entry expired ({:.1}h old), fetching fresh data",
                age.num_minutes() as f64 / 60.0
            );
            return Ok(None);
        }

        info!(
            "Valid cache entry found ({:.1}h old)",
            age.num_minutes() as f64 / 60.0
        );
        Ok(Some(entry))
    }

    /// Write an entry stamped with `now`, replacing any existing one
    pub fn save_at(
        &self,
        branch: &str,
        repos: &[String],
        manifests: &ManifestSet,
        latest_versions: &LatestVersions,
        now: DateTime<Utc>,
    ) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry {
            timestamp: now,
            date: now.date_naive(),
            manifests: manifests.clone(),
            latest_versions: latest_versions.clone(),
        };

        let path = self.entry_path(branch, repos, entry.date);
        std::fs::write(&path, serde_json::to_string_pretty(&entry)?)?;

        Ok(path)
    }

    /// Delete cache files last modified before `now - validity`
    pub fn evict_modified_before(&self, now: SystemTime) -> Result<usize, CacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let max_age = self.validity.to_std().unwrap_or_default();
        let mut removed = 0;

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if !is_cache_file(file_name) {
                continue;
            }

            // Per-file failures are skipped, the next run will retry them
            let expired = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);

            if expired && std::fs::remove_file(entry.path()).is_ok() {
                info!("Removed expired cache entry {}", file_name);
                removed += 1;
            }
        }

        Ok(removed)
    }
}

impl SnapshotStorer for Cache {
    fn load(&self, branch: &str, repos: &[String]) -> Option<CacheEntry> {
        self.load_at(branch, repos, Utc::now())
            .inspect_err(|e| debug!("Ignoring unreadable cache entry: {}", e))
            .ok()
            .flatten()
    }

    fn save(
        &self,
        branch: &str,
        repos: &[String],
        manifests: &ManifestSet,
        latest_versions: &LatestVersions,
    ) {
        match self.save_at(branch, repos, manifests, latest_versions, Utc::now()) {
            Ok(path) => info!("Snapshot cached at {:?}", path),
            Err(e) => warn!("Unable to save cache: {}", e),
        }
    }

    fn evict_expired(&self) -> usize {
        self.evict_modified_before(SystemTime::now())
            .inspect_err(|e| warn!("Unable to clean cache directory {:?}: {}", self.dir, e))
            .unwrap_or(0)
    }
}
