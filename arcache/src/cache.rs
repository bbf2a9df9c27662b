// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

pub mod async_cache;
pub mod entry;
pub mod eviction;
pub(crate) mod index;
pub(crate) mod recovery;

use crate::cache::entry::{file_name, read_payload, write_file, CacheEntry};
use crate::cache::eviction::{enforce_limits, remove_entry, remove_file, CacheLimits};
use crate::cache::index::CacheIndex;
use crate::core::clock::{Clock, SystemClock};
use crate::location::StorageLocation;
use arcache_base::error::CacheError;
use arcache_base::not_initialized;
use bytes::Bytes;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Name of the cache directory under the storage root.
pub const CACHE_SUBDIR: &str = "webcache";

/// Behaviour of a cache instance
#[derive(Clone, Debug, PartialEq)]
pub struct CacheSettings {
    pub limits: CacheLimits,
    /// A disabled cache misses every lookup and drops every insert
    pub enabled: bool,
    /// Delete rank-named files with a broken header during recovery
    pub prune_orphans: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            limits: CacheLimits::unlimited(),
            enabled: true,
            prune_orphans: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheStats {
    pub directory: PathBuf,
    pub entries: usize,
    pub total_size: u64,
}

struct CacheState {
    dir: PathBuf,
    index: CacheIndex,
}

/// Persistent LRU cache of downloaded payloads.
///
/// Every payload lives in its own file named after its last access rank,
/// so the index is rebuilt from the directory listing on start.
/// One lock serializes all operations; there must be only one instance per directory.
pub struct DiskCache {
    location: Box<dyn StorageLocation>,
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
    state: OnceLock<Mutex<CacheState>>,
}

impl DiskCache {
    pub fn new(location: impl StorageLocation + 'static, settings: CacheSettings) -> Self {
        DiskCache {
            location: Box::new(location),
            settings,
            clock: Arc::new(SystemClock),
            state: OnceLock::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Recovers the index from disk and applies the limits.
    ///
    /// Runs only once, concurrent callers wait until the first one has finished.
    pub fn initialize(&self) {
        self.state.get_or_init(|| Mutex::new(self.recover()));
    }

    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// Directory of the cache files, known after initialization.
    pub fn directory(&self) -> Option<PathBuf> {
        self.state.get().map(|state| state.lock().dir.clone())
    }

    /// Returns the payload of a key and makes it the most recently used one.
    ///
    /// A broken or unreadable entry is evicted and reported as a miss.
    ///
    /// # Errors
    ///
    /// * `NotInitialized` - If `initialize` wasn't called.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let state = self.state()?;
        if !self.settings.enabled {
            return Ok(None);
        }

        let mut state = state.lock();
        let CacheState { dir, index } = &mut *state;
        let Some(entry) = index.lookup(key).cloned() else {
            trace!("Cache miss for {}", key);
            return Ok(None);
        };

        let path = dir.join(entry.file_name());
        let payload = match read_payload(&path, entry.header_len()) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Failed to read cached {} from {:?}: {}", key, path, err);
                remove_entry(dir, index, key);
                return Ok(None);
            }
        };

        let Some(rank) = index.next_rank(self.clock.now_millis()) else {
            warn!("Ranks are exhausted in {:?}, {} is served without promotion", dir, key);
            return Ok(Some(payload));
        };

        let new_path = dir.join(file_name(rank));
        if let Err(err) = fs::rename(&path, &new_path) {
            warn!("Failed to promote {} to {:?}: {}", key, new_path, err);
            remove_entry(dir, index, key);
            return Ok(None);
        }

        index.rerank(key, rank);
        trace!("Cache hit for {}, rank {} -> {}", key, entry.rank(), rank);
        Ok(Some(payload))
    }

    /// Stores a payload, replacing a previous one with the same key,
    /// and evicts old entries if a limit is exceeded.
    ///
    /// # Returns
    ///
    /// `true` if the payload was cached, `false` if it was dropped because of a write error,
    /// an invalid key, exhausted ranks or a disabled cache.
    ///
    /// # Errors
    ///
    /// * `NotInitialized` - If `initialize` wasn't called.
    pub fn put(&self, key: &str, payload: &[u8]) -> Result<bool, CacheError> {
        let state = self.state()?;
        if !self.settings.enabled {
            return Ok(false);
        }

        let mut state = state.lock();
        let CacheState { dir, index } = &mut *state;
        let now = self.clock.now_millis();
        let Some(rank) = index.next_rank(now) else {
            warn!("Ranks are exhausted in {:?}, {} is not cached", dir, key);
            return Ok(false);
        };

        if let Some(previous) = remove_entry(dir, index, key) {
            trace!("Replacing {} at rank {}", key, previous.rank());
        }

        let path = dir.join(file_name(rank));
        let (header_len, file_len) = match write_file(&path, key, payload) {
            Ok(lengths) => lengths,
            Err(err) => {
                warn!("Failed to cache {} in {:?}: {}", key, path, err);
                remove_file(&path);
                return Ok(false);
            }
        };

        index.insert(CacheEntry::new(key.to_string(), rank, header_len, file_len));
        trace!("Cached {} at rank {} ({} bytes)", key, rank, file_len);

        enforce_limits(dir, index, &self.settings.limits, now);
        Ok(true)
    }

    /// Removes all entries and their files.
    pub fn clear(&self) -> Result<(), CacheError> {
        let mut state = self.state()?.lock();
        let CacheState { dir, index } = &mut *state;
        if index.is_empty() {
            return Ok(());
        }

        let entries = index.drain();
        for entry in &entries {
            remove_file(&dir.join(entry.file_name()));
        }

        info!("Cleared {} entries from {:?}", entries.len(), dir);
        Ok(())
    }

    /// Evicts the least recently used entries while a limit is exceeded.
    ///
    /// # Returns
    ///
    /// The number of evicted entries.
    pub fn enforce_limits(&self) -> Result<usize, CacheError> {
        let mut state = self.state()?.lock();
        let CacheState { dir, index } = &mut *state;
        let evicted = enforce_limits(dir, index, &self.settings.limits, self.clock.now_millis());
        Ok(evicted.len())
    }

    pub fn contains(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.state()?.lock().index.lookup(key).is_some())
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let state = self.state()?.lock();
        Ok(CacheStats {
            directory: state.dir.clone(),
            entries: state.index.len(),
            total_size: state.index.total_size(),
        })
    }

    /// Location of an entry's file.
    pub fn file_of(&self, key: &str) -> Result<Option<PathBuf>, CacheError> {
        let state = self.state()?.lock();
        Ok(state
            .index
            .lookup(key)
            .map(|entry| state.dir.join(entry.file_name())))
    }

    /// Keys and ranks from the least to the most recently used.
    pub fn ranks(&self) -> Result<Vec<(String, u64)>, CacheError> {
        let state = self.state()?.lock();
        Ok(state
            .index
            .iter()
            .map(|e| (e.key().to_string(), e.rank()))
            .collect())
    }

    fn state(&self) -> Result<&Mutex<CacheState>, CacheError> {
        self.state
            .get()
            .ok_or_else(|| not_initialized!("Cache must be initialized before use"))
    }

    fn recover(&self) -> CacheState {
        // the root belongs to the location, only the subdirectory is ours
        let dir = self.location.root().join(CACHE_SUBDIR);
        match fs::create_dir(&dir) {
            Ok(()) => debug!("Created cache directory {:?}", dir),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => warn!("Failed to create cache directory {:?}: {}", dir, err),
        }

        let mut index = recovery::rebuild(&dir, self.settings.prune_orphans);
        let evicted = enforce_limits(
            &dir,
            &mut index,
            &self.settings.limits,
            self.clock.now_millis(),
        );
        if !evicted.is_empty() {
            debug!("Evicted {} entries left from the last session", evicted.len());
        }

        CacheState { dir, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::MAX_RANK;
    use crate::core::clock::tests::ManualClock;
    use crate::location::FixedLocation;
    use arcache_base::error::ErrorCode;
    use assert_matches::assert_matches;
    use rstest::{fixture, rstest};
    use std::thread;
    use tempfile::{tempdir, TempDir};

    const START: u64 = 1_700_000_000_000;

    #[fixture]
    fn root() -> TempDir {
        tempdir().unwrap()
    }

    #[fixture]
    fn clock() -> ManualClock {
        ManualClock::new(START)
    }

    fn settings(limits: CacheLimits) -> CacheSettings {
        CacheSettings {
            limits,
            enabled: true,
            prune_orphans: false,
        }
    }

    fn open(root: &TempDir, limits: CacheLimits, clock: &ManualClock) -> DiskCache {
        let cache = DiskCache::new(FixedLocation::new(root.path()), settings(limits))
            .with_clock(clock.clone());
        cache.initialize();
        cache
    }

    fn cache_dir(root: &TempDir) -> PathBuf {
        root.path().join(CACHE_SUBDIR)
    }

    fn count_files(root: &TempDir) -> usize {
        fs::read_dir(cache_dir(root)).unwrap().count()
    }

    #[rstest]
    fn test_not_initialized(root: TempDir) {
        let cache = DiskCache::new(FixedLocation::new(root.path()), CacheSettings::default());

        assert!(!cache.is_initialized());
        assert_matches!(
            cache.get("key"),
            Err(CacheError {
                status: ErrorCode::NotInitialized,
                ..
            })
        );
        assert_eq!(
            cache.put("key", b"data").unwrap_err().status,
            ErrorCode::NotInitialized
        );
        assert_eq!(cache.clear().unwrap_err().status, ErrorCode::NotInitialized);
        assert!(cache.directory().is_none());
    }

    #[rstest]
    fn test_creates_directory(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        assert!(cache_dir(&root).is_dir());
        assert_eq!(cache.directory(), Some(cache_dir(&root)));
    }

    #[rstest]
    fn test_missing_root(root: TempDir, clock: ManualClock) {
        let cache = DiskCache::new(
            FixedLocation::new(root.path().join("unmounted")),
            settings(CacheLimits::unlimited()),
        )
        .with_clock(clock);
        cache.initialize();

        assert!(!root.path().join("unmounted").exists());
        assert_eq!(cache.stats().unwrap().entries, 0);
        assert!(!cache.put("key", b"data").unwrap());
        assert_eq!(cache.get("key").unwrap(), None);
    }

    #[rstest]
    fn test_round_trip(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        let payload = b"\x89PNG\r\n\x1a\n\x00\x00binary".to_vec();

        assert!(cache.put("http%3A%2F%2Fa.png", &payload).unwrap());
        assert_eq!(
            cache.get("http%3A%2F%2Fa.png").unwrap(),
            Some(Bytes::from(payload))
        );
        assert_eq!(cache.get("unknown").unwrap(), None);
    }

    #[rstest]
    fn test_file_format(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        cache.put("key", b"payload").unwrap();

        let path = cache_dir(&root).join(format!("{}.arcache", START));
        assert_eq!(fs::read(path).unwrap(), b"key\npayload");
        assert_eq!(
            cache.stats().unwrap(),
            CacheStats {
                directory: cache_dir(&root),
                entries: 1,
                total_size: 11,
            }
        );
    }

    #[rstest]
    fn test_put_replaces_entry(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        cache.put("key", b"first").unwrap();
        let first_file = cache.file_of("key").unwrap().unwrap();
        cache.put("key", b"second!").unwrap();

        assert!(!first_file.exists());
        assert_eq!(count_files(&root), 1);
        assert_eq!(cache.get("key").unwrap(), Some(Bytes::from_static(b"second!")));
        assert_eq!(cache.stats().unwrap().total_size, 11);
    }

    #[rstest]
    fn test_put_invalid_key(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);

        assert!(!cache.put("two\nlines", b"data").unwrap());
        assert!(!cache.contains("two\nlines").unwrap());
        assert_eq!(count_files(&root), 0);
    }

    #[rstest]
    fn test_put_into_missing_directory(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        fs::remove_dir_all(cache_dir(&root)).unwrap();

        assert!(!cache.put("key", b"data").unwrap());
        assert_eq!(cache.stats().unwrap().entries, 0);
    }

    #[rstest]
    fn test_ranks_with_frozen_clock(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        for key in ["a", "b", "c"] {
            cache.put(key, b"x").unwrap();
        }
        cache.get("a").unwrap();

        assert_eq!(
            cache.ranks().unwrap(),
            vec![
                ("b".to_string(), START + 1),
                ("c".to_string(), START + 2),
                ("a".to_string(), START + 3)
            ]
        );
    }

    #[rstest]
    fn test_promotion_on_read(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        for key in ["a", "b", "c"] {
            cache.put(key, b"x").unwrap();
            clock.advance(10);
        }

        let old_file = cache.file_of("a").unwrap().unwrap();
        cache.get("a").unwrap().unwrap();
        let new_file = cache.file_of("a").unwrap().unwrap();

        let ranks = cache.ranks().unwrap();
        assert_eq!(ranks.last().unwrap(), &("a".to_string(), START + 30));
        assert!(!old_file.exists());
        assert_eq!(new_file, cache_dir(&root).join(file_name(START + 30)));
        assert_eq!(fs::read(new_file).unwrap(), b"a\nx");
    }

    #[rstest]
    fn test_eviction_by_count(root: TempDir, clock: ManualClock) {
        let limits = CacheLimits {
            max_entry_count: 3,
            ..CacheLimits::unlimited()
        };
        let cache = open(&root, limits, &clock);
        for key in ["1", "2", "3", "4", "5"] {
            cache.put(key, b"data").unwrap();
        }

        assert_eq!(cache.get("1").unwrap(), None);
        assert_eq!(cache.get("2").unwrap(), None);
        for key in ["3", "4", "5"] {
            assert!(cache.get(key).unwrap().is_some());
        }
        assert_eq!(count_files(&root), 3);
    }

    #[rstest]
    fn test_eviction_respects_reads(root: TempDir, clock: ManualClock) {
        let limits = CacheLimits {
            max_entry_count: 2,
            ..CacheLimits::unlimited()
        };
        let cache = open(&root, limits, &clock);
        cache.put("a", b"data").unwrap();
        cache.put("b", b"data").unwrap();
        cache.get("a").unwrap();
        cache.put("c", b"data").unwrap();

        assert!(cache.contains("a").unwrap());
        assert!(!cache.contains("b").unwrap());
        assert!(cache.contains("c").unwrap());
    }

    #[rstest]
    fn test_eviction_by_size_keeps_one(root: TempDir, clock: ManualClock) {
        let limits = CacheLimits {
            max_total_bytes: 1,
            ..CacheLimits::unlimited()
        };
        let cache = open(&root, limits, &clock);

        cache.put("big", &[7u8; 1000]).unwrap();
        assert_eq!(cache.get("big").unwrap().unwrap().len(), 1000);

        cache.put("bigger", &[8u8; 2000]).unwrap();
        assert!(!cache.contains("big").unwrap());
        assert_eq!(cache.get("bigger").unwrap().unwrap().len(), 2000);
        assert_eq!(cache.stats().unwrap().entries, 1);
    }

    #[rstest]
    fn test_eviction_by_age(root: TempDir, clock: ManualClock) {
        let limits = CacheLimits {
            max_age_ms: 1000,
            ..CacheLimits::unlimited()
        };
        let cache = open(&root, limits, &clock);
        cache.put("old", b"data").unwrap();
        clock.advance(500);
        cache.put("recent", b"data").unwrap();
        clock.advance(800);
        cache.put("new", b"data").unwrap();

        assert!(!cache.contains("old").unwrap());
        assert!(cache.contains("recent").unwrap());

        clock.advance(5000);
        assert_eq!(cache.enforce_limits().unwrap(), 1);
        assert_eq!(cache.ranks().unwrap().len(), 1);
        assert!(cache.contains("new").unwrap());
    }

    #[rstest]
    fn test_corrupted_file_is_evicted_on_read(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        cache.put("key", b"payload").unwrap();
        let path = cache.file_of("key").unwrap().unwrap();
        fs::write(&path, b"ke").unwrap();

        assert_eq!(cache.get("key").unwrap(), None);
        assert!(!cache.contains("key").unwrap());
        assert!(!path.exists());
        assert_eq!(cache.stats().unwrap().total_size, 0);
    }

    #[rstest]
    fn test_missing_file_is_evicted_on_read(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        cache.put("key", b"payload").unwrap();
        fs::remove_file(cache.file_of("key").unwrap().unwrap()).unwrap();

        assert_eq!(cache.get("key").unwrap(), None);
        assert!(!cache.contains("key").unwrap());
    }

    #[rstest]
    fn test_failed_promotion_is_evicted(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        cache.put("key", b"payload").unwrap();
        let old_file = cache.file_of("key").unwrap().unwrap();

        clock.advance(10);
        let blocker = cache_dir(&root).join(file_name(START + 10));
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("file"), b"").unwrap();

        assert_eq!(cache.get("key").unwrap(), None);
        assert!(!cache.contains("key").unwrap());
        assert!(!old_file.exists());
        assert_eq!(cache.stats().unwrap().total_size, 0);
    }

    #[rstest]
    #[case(u64::MAX)]
    #[case(MAX_RANK + 1)]
    fn test_out_of_range_rank_is_ignored(root: TempDir, clock: ManualClock, #[case] rank: u64) {
        fs::create_dir(cache_dir(&root)).unwrap();
        let foreign = cache_dir(&root).join(format!("{}.arcache", rank));
        fs::write(&foreign, b"k\nv").unwrap();

        let cache = open(&root, CacheLimits::unlimited(), &clock);
        assert!(!cache.contains("k").unwrap());

        assert!(cache.put("x", b"y").unwrap());
        assert_eq!(cache.ranks().unwrap(), vec![("x".to_string(), START)]);
        assert_eq!(cache.get("x").unwrap(), Some(Bytes::from_static(b"y")));
        assert!(foreign.exists());
    }

    #[rstest]
    fn test_exhausted_ranks(root: TempDir, clock: ManualClock) {
        fs::create_dir(cache_dir(&root)).unwrap();
        write_file(&cache_dir(&root).join(file_name(MAX_RANK)), "k", b"v").unwrap();

        let cache = open(&root, CacheLimits::unlimited(), &clock);
        assert!(cache.contains("k").unwrap());

        assert!(!cache.put("x", b"y").unwrap());
        assert!(!cache.contains("x").unwrap());
        assert_eq!(cache.get("k").unwrap(), Some(Bytes::from_static(b"v")));
        assert_eq!(cache.ranks().unwrap(), vec![("k".to_string(), MAX_RANK)]);

        assert!(!cache.put("k", b"w").unwrap());
        assert_eq!(cache.get("k").unwrap(), Some(Bytes::from_static(b"v")));
    }

    #[rstest]
    fn test_clear(root: TempDir, clock: ManualClock) {
        let cache = open(&root, CacheLimits::unlimited(), &clock);
        fs::write(cache_dir(&root).join("foreign.txt"), b"keep me").unwrap();
        for key in ["a", "b", "c"] {
            cache.put(key, b"data").unwrap();
        }

        cache.clear().unwrap();

        assert_eq!(cache.stats().unwrap().entries, 0);
        assert_eq!(cache.stats().unwrap().total_size, 0);
        assert_eq!(count_files(&root), 1);
        assert_eq!(cache.get("a").unwrap(), None);

        cache.put("d", b"data").unwrap();
        assert!(cache.contains("d").unwrap());
    }

    #[rstest]
    fn test_disabled_cache(root: TempDir) {
        let cache = DiskCache::new(
            FixedLocation::new(root.path()),
            CacheSettings {
                enabled: false,
                ..CacheSettings::default()
            },
        );
        cache.initialize();

        assert!(!cache.put("key", b"data").unwrap());
        assert_eq!(cache.get("key").unwrap(), None);
        assert_eq!(count_files(&root), 0);
    }

    #[rstest]
    fn test_persistence(root: TempDir, clock: ManualClock) {
        {
            let cache = open(&root, CacheLimits::unlimited(), &clock);
            cache.put("a", b"alpha").unwrap();
            cache.put("b", b"beta").unwrap();
            cache.get("a").unwrap();
        }

        let cache = open(&root, CacheLimits::unlimited(), &clock);
        assert_eq!(
            cache.ranks().unwrap(),
            vec![("b".to_string(), START + 1), ("a".to_string(), START + 2)]
        );
        assert_eq!(cache.get("a").unwrap(), Some(Bytes::from_static(b"alpha")));
        assert_eq!(cache.get("b").unwrap(), Some(Bytes::from_static(b"beta")));

        cache.put("c", b"gamma").unwrap();
        assert_eq!(cache.ranks().unwrap().last().unwrap().1, START + 5);
    }

    #[rstest]
    fn test_limits_applied_on_start(root: TempDir, clock: ManualClock) {
        {
            let cache = open(&root, CacheLimits::unlimited(), &clock);
            for key in ["a", "b", "c", "d"] {
                cache.put(key, b"data").unwrap();
            }
        }

        let limits = CacheLimits {
            max_entry_count: 2,
            ..CacheLimits::unlimited()
        };
        let cache = open(&root, limits, &clock);
        assert_eq!(
            cache
                .ranks()
                .unwrap()
                .into_iter()
                .map(|(k, _)| k)
                .collect::<Vec<_>>(),
            vec!["c", "d"]
        );
        assert_eq!(count_files(&root), 2);
    }

    #[rstest]
    fn test_initialize_once(root: TempDir, clock: ManualClock) {
        let cache = Arc::new(
            DiskCache::new(
                FixedLocation::new(root.path()),
                settings(CacheLimits::unlimited()),
            )
            .with_clock(clock),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.initialize();
                    cache.put("shared", b"data").unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        cache.initialize();
        assert_eq!(cache.stats().unwrap().entries, 1);
        assert_eq!(count_files(&root), 1);
    }

    #[rstest]
    fn test_concurrent_access(root: TempDir) {
        let limits = CacheLimits {
            max_entry_count: 16,
            ..CacheLimits::unlimited()
        };
        let cache = Arc::new(
            DiskCache::new(FixedLocation::new(root.path()), settings(limits))
                .with_clock(ManualClock::new(START)),
        );
        cache.initialize();

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50 {
                        let key = format!("{}-{}", worker, i % 20);
                        let payload = key.as_bytes().repeat(3);
                        cache.put(&key, &payload).unwrap();
                        if let Some(cached) = cache.get(&key).unwrap() {
                            assert_eq!(cached, Bytes::from(payload));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats().unwrap();
        let ranks = cache.ranks().unwrap();
        assert_eq!(stats.entries, 16);
        assert_eq!(count_files(&root), 16);
        assert!(ranks.windows(2).all(|w| w[0].1 < w[1].1));

        let expected_size: u64 = ranks
            .iter()
            .map(|(key, _)| (key.len() * 4 + 1) as u64)
            .sum();
        assert_eq!(stats.total_size, expected_size);
    }
}
