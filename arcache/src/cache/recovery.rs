// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::entry::{parse_rank, read_header, CacheEntry};
use crate::cache::eviction::remove_file;
use crate::cache::index::CacheIndex;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Rebuilds the index from the cache files in `dir`.
///
/// Foreign files and directories are ignored. Files with a rank-shaped name
/// but an unreadable header are skipped, or deleted if `prune_orphans` is set.
/// If two files carry the same key, the one with the higher rank wins and
/// the other file is deleted.
pub(crate) fn rebuild(dir: &Path, prune_orphans: bool) -> CacheIndex {
    let start_time = Instant::now();
    let mut index = CacheIndex::new();

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(err) => {
            warn!("Failed to list cache directory {:?}: {}", dir, err);
            return index;
        }
    };

    let mut candidates = BTreeMap::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(dir_entry) => dir_entry,
            Err(err) => {
                warn!("Failed to read entry in {:?}: {}", dir, err);
                continue;
            }
        };

        let path = dir_entry.path();
        let Some(rank) = dir_entry.file_name().to_str().and_then(parse_rank) else {
            continue;
        };

        let metadata = match dir_entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };

        match read_header(&path) {
            Ok((key, header_len)) => {
                candidates.insert(
                    rank,
                    CacheEntry::new(key, rank, header_len, metadata.len()),
                );
            }
            Err(err) if prune_orphans => {
                warn!("Removing corrupted cache file {:?}: {}", path, err);
                remove_file(&path);
            }
            Err(err) => {
                warn!("Skipping corrupted cache file {:?}: {}", path, err);
            }
        }
    }

    // ascending rank, so the most recent file of a key is inserted last
    for entry in candidates.into_values() {
        if let Some(older) = index.insert(entry) {
            warn!(
                "Found duplicate of {} at rank {}, removing it",
                older.key(),
                older.rank()
            );
            remove_file(&dir.join(older.file_name()));
        }
    }

    info!(
        "Recovered cache {:?} in {}ms: entries={}, size={}",
        dir,
        start_time.elapsed().as_millis(),
        index.len(),
        index.total_size()
    );
    if let Some(newest) = index.newest() {
        debug!("Most recent entry {} at rank {}", newest.key(), newest.rank());
    }
    index
}
