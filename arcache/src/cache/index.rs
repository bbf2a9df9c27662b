// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::entry::{CacheEntry, MAX_RANK};
use std::collections::{BTreeMap, HashMap};

/// Key lookup and recency order of the live cache entries.
///
/// Both maps always hold the same entries with the same ranks, and
/// `total_size` is the sum of their file lengths.
#[derive(Debug, Default)]
pub(crate) struct CacheIndex {
    entries: HashMap<String, CacheEntry>,
    ranks: BTreeMap<u64, String>,
    total_size: u64,
    last_rank: Option<u64>,
}

impl CacheIndex {
    pub fn new() -> Self {
        CacheIndex::default()
    }

    pub fn lookup(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Inserts an entry, replacing an entry with the same key.
    ///
    /// # Returns
    ///
    /// The replaced entry, its file is not touched.
    pub fn insert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let replaced = self.remove(entry.key());
        debug_assert!(
            !self.ranks.contains_key(&entry.rank()),
            "rank {} is already taken",
            entry.rank()
        );

        self.observe_rank(entry.rank());
        self.total_size += entry.file_len();
        self.ranks.insert(entry.rank(), entry.key().to_string());
        self.entries.insert(entry.key().to_string(), entry);
        replaced
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.ranks.remove(&entry.rank());
        self.total_size -= entry.file_len();
        Some(entry)
    }

    /// Moves an entry to a new rank.
    ///
    /// # Returns
    ///
    /// The updated entry or `None` if the key is unknown.
    pub fn rerank(&mut self, key: &str, rank: u64) -> Option<&CacheEntry> {
        let entry = self.entries.get_mut(key)?;
        self.ranks.remove(&entry.rank());
        entry.set_rank(rank);
        self.ranks.insert(rank, key.to_string());

        self.observe_rank(rank);
        self.entries.get(key)
    }

    /// The least recently used entry.
    pub fn oldest(&self) -> Option<&CacheEntry> {
        self.ranks
            .first_key_value()
            .and_then(|(_, key)| self.entries.get(key))
    }

    /// The most recently used entry.
    pub fn newest(&self) -> Option<&CacheEntry> {
        self.ranks
            .last_key_value()
            .and_then(|(_, key)| self.entries.get(key))
    }

    /// Allocates a rank higher than any rank this index has seen.
    ///
    /// # Arguments
    ///
    /// * `now` - Current wall clock in milliseconds.
    ///
    /// # Returns
    ///
    /// `None` if the ranks are exhausted, i.e. the next rank would exceed `MAX_RANK`.
    pub fn next_rank(&mut self, now: u64) -> Option<u64> {
        let rank = match self.last_rank {
            Some(last) if last >= now => last.checked_add(1)?,
            _ => now,
        };
        if rank > MAX_RANK {
            return None;
        }

        self.last_rank = Some(rank);
        Some(rank)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Entries from the least to the most recently used.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.ranks.values().filter_map(|key| self.entries.get(key))
    }

    /// Removes all entries, the rank counter is kept.
    pub fn drain(&mut self) -> Vec<CacheEntry> {
        self.ranks.clear();
        self.total_size = 0;
        let mut entries: Vec<CacheEntry> = self.entries.drain().map(|(_, e)| e).collect();
        entries.sort_by_key(|e| e.rank());
        entries
    }

    fn observe_rank(&mut self, rank: u64) {
        if self.last_rank.map_or(true, |last| rank > last) {
            self.last_rank = Some(rank);
        }
    }
}
