// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Supplies the writable root under which the cache keeps its directory.
pub trait StorageLocation: Send + Sync {
    fn root(&self) -> PathBuf;
}

/// Always the same root.
#[derive(Clone, Debug)]
pub struct FixedLocation {
    root: PathBuf,
}

impl FixedLocation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FixedLocation { root: root.into() }
    }
}

impl StorageLocation for FixedLocation {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }
}

/// Prefers a root on removable storage and falls back to the internal one.
#[derive(Clone, Debug)]
pub struct FallbackLocation {
    preferred: Option<PathBuf>,
    fallback: PathBuf,
}

impl FallbackLocation {
    pub fn new(preferred: Option<PathBuf>, fallback: PathBuf) -> Self {
        FallbackLocation {
            preferred,
            fallback,
        }
    }
}

impl StorageLocation for FallbackLocation {
    fn root(&self) -> PathBuf {
        match &self.preferred {
            Some(preferred) if is_writable_dir(preferred) => preferred.clone(),
            Some(preferred) => {
                debug!(
                    "{:?} is not a writable directory, using {:?}",
                    preferred, self.fallback
                );
                self.fallback.clone()
            }
            None => self.fallback.clone(),
        }
    }
}

fn is_writable_dir(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}
