// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::DiskCache;
use arcache_base::error::CacheError;
use bytes::Bytes;
use log::{debug, warn};
use std::sync::Arc;
use url::form_urlencoded::byte_serialize;

/// Turns a URL into a cache key.
///
/// The form encoding escapes line breaks, so the key always fits into the header line.
pub fn normalize_key(url: &str) -> String {
    byte_serialize(url.as_bytes()).collect()
}

/// Fetches payloads which are not cached yet.
pub trait Downloader: Send + Sync {
    /// Downloads the payload of a URL.
    ///
    /// # Errors
    ///
    /// * `FetchFailed` - If the payload can't be retrieved.
    fn download(&self, url: &str) -> Result<Bytes, CacheError>;
}

/// Serves payloads from the cache and downloads missing ones.
pub struct ReadThrough<D: Downloader> {
    cache: Arc<DiskCache>,
    downloader: D,
}

impl<D: Downloader> ReadThrough<D> {
    pub fn new(cache: Arc<DiskCache>, downloader: D) -> Self {
        ReadThrough { cache, downloader }
    }

    pub fn cache(&self) -> &Arc<DiskCache> {
        &self.cache
    }

    /// Returns the payload of a URL, from the cache if possible.
    ///
    /// A payload that can't be cached is still returned.
    ///
    /// # Errors
    ///
    /// * `NotInitialized` - If the cache wasn't initialized.
    /// * `FetchFailed` - If the payload isn't cached and the download failed.
    pub fn fetch(&self, url: &str) -> Result<Bytes, CacheError> {
        let key = normalize_key(url);
        if let Some(payload) = self.cache.get(&key)? {
            debug!("Serving {} from cache", url);
            return Ok(payload);
        }

        let payload = self.downloader.download(url)?;
        if !self.cache.put(&key, &payload)? {
            warn!("Downloaded {} but couldn't cache it", url);
        }
        Ok(payload)
    }
}
