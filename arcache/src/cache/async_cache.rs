// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::{CacheStats, DiskCache};
use arcache_base::error::CacheError;
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::spawn_blocking;

/// Async facade of [`DiskCache`] which moves the blocking file IO to the tokio blocking pool.
#[derive(Clone)]
pub struct AsyncDiskCache {
    inner: Arc<DiskCache>,
}

impl AsyncDiskCache {
    pub fn new(cache: DiskCache) -> Self {
        AsyncDiskCache {
            inner: Arc::new(cache),
        }
    }

    pub fn from_shared(cache: Arc<DiskCache>) -> Self {
        AsyncDiskCache { inner: cache }
    }

    pub fn inner(&self) -> &Arc<DiskCache> {
        &self.inner
    }

    pub async fn initialize(&self) -> Result<(), CacheError> {
        self.run(|cache| {
            cache.initialize();
            Ok(())
        })
        .await
    }

    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let key = key.to_string();
        self.run(move |cache| cache.get(&key)).await
    }

    pub async fn put(&self, key: &str, payload: Bytes) -> Result<bool, CacheError> {
        let key = key.to_string();
        self.run(move |cache| cache.put(&key, &payload)).await
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        self.run(|cache| cache.clear()).await
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        self.run(|cache| cache.stats()).await
    }

    async fn run<T, F>(&self, func: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&DiskCache) -> Result<T, CacheError> + Send + 'static,
    {
        let cache = Arc::clone(&self.inner);
        spawn_blocking(move || func(&cache))
            .await
            .map_err(|err| CacheError::interrupted(&format!("Cache task failed: {}", err)))?
    }
}
