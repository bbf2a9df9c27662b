// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::entry::CacheEntry;
use crate::cache::index::CacheIndex;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;

/// Limits of the cache, a value `<= 0` disables the limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheLimits {
    /// Maximum time since the last access in milliseconds
    pub max_age_ms: i64,
    /// Maximum number of entries
    pub max_entry_count: i64,
    /// Maximum size of all cache files in bytes
    pub max_total_bytes: i64,
}

impl CacheLimits {
    pub fn unlimited() -> Self {
        CacheLimits {
            max_age_ms: 0,
            max_entry_count: 0,
            max_total_bytes: 0,
        }
    }

    /// Checks if the index violates any limit.
    pub(crate) fn exceeded_by(&self, index: &CacheIndex, now: u64) -> bool {
        let too_old = self.max_age_ms > 0
            && index
                .oldest()
                .is_some_and(|e| now.saturating_sub(e.rank()) > self.max_age_ms as u64);
        let too_big = self.max_total_bytes > 0 && index.total_size() > self.max_total_bytes as u64;
        let too_many = self.max_entry_count > 0 && index.len() as u64 > self.max_entry_count as u64;

        too_old || too_big || too_many
    }
}

impl Default for CacheLimits {
    fn default() -> Self {
        CacheLimits::unlimited()
    }
}

/// Removes the least recently used entries while a limit is violated.
///
/// The most recent entry always survives, even if it breaks a limit alone.
/// File system errors are logged and swallowed.
///
/// # Returns
///
/// The evicted entries, oldest first.
pub(crate) fn enforce_limits(
    dir: &Path,
    index: &mut CacheIndex,
    limits: &CacheLimits,
    now: u64,
) -> Vec<CacheEntry> {
    let mut evicted = Vec::new();
    while index.len() > 1 && limits.exceeded_by(index, now) {
        let Some(key) = index.oldest().map(|e| e.key().to_string()) else {
            break;
        };

        if let Some(entry) = remove_entry(dir, index, &key) {
            debug!(
                "Evicted {} (rank={}, size={}), {} entries / {} bytes left",
                entry.key(),
                entry.rank(),
                entry.file_len(),
                index.len(),
                index.total_size()
            );
            evicted.push(entry);
        }
    }
    evicted
}

/// Removes an entry from the index and deletes its file.
pub(crate) fn remove_entry(dir: &Path, index: &mut CacheIndex, key: &str) -> Option<CacheEntry> {
    let entry = index.remove(key)?;
    remove_file(&dir.join(entry.file_name()));
    Some(entry)
}

/// Deletes a cache file, a missing file is fine.
pub(crate) fn remove_file(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove cache file {:?}: {}", path, err);
        }
    }
}
