// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use crate::cache::eviction::CacheLimits;
use crate::cache::CacheSettings;
use crate::core::env::{Env, GetEnv};
use crate::location::FallbackLocation;
use bytesize::ByteSize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;
pub const DEFAULT_MAX_FILES: i64 = 256;
pub const DEFAULT_MAX_SIZE: &str = "64MiB";

/// Cache configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Cfg {
    pub log_level: String,
    /// Root used when the external one is missing or not writable
    pub cache_dir: PathBuf,
    /// Preferred root, usually on external storage
    pub external_cache_dir: Option<PathBuf>,
    pub settings: CacheSettings,
    env_message: String,
}

impl Cfg {
    pub fn from_env<EnvGetter: GetEnv>(getter: EnvGetter) -> Self {
        let mut env = Env::new(getter);

        let log_level = env.get("ARC_LOG_LEVEL", DEFAULT_LOG_LEVEL.to_string());
        let cache_dir = env
            .get_optional::<String>("ARC_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);
        let external_cache_dir = env
            .get_optional::<String>("ARC_EXTERNAL_CACHE_DIR")
            .map(PathBuf::from);

        let settings = CacheSettings {
            enabled: env.get("ARC_CACHE_ENABLED", true),
            prune_orphans: env.get("ARC_CACHE_PRUNE_ORPHANS", false),
            limits: Self::parse_limits(&mut env),
        };

        Cfg {
            log_level,
            cache_dir,
            external_cache_dir,
            settings,
            env_message: env.message().to_string(),
        }
    }

    fn parse_limits<EnvGetter: GetEnv>(env: &mut Env<EnvGetter>) -> CacheLimits {
        let max_age_secs = env.get("ARC_CACHE_MAX_AGE", DEFAULT_MAX_AGE_SECS);
        let max_size = env.get(
            "ARC_CACHE_MAX_SIZE",
            DEFAULT_MAX_SIZE
                .parse::<ByteSize>()
                .unwrap_or(ByteSize::mib(64)),
        );

        CacheLimits {
            max_age_ms: max_age_secs.saturating_mul(1000),
            max_entry_count: env.get("ARC_CACHE_MAX_FILES", DEFAULT_MAX_FILES),
            max_total_bytes: i64::try_from(max_size.as_u64()).unwrap_or(i64::MAX),
        }
    }

    /// The resolver picking the cache root from the configured directories.
    pub fn location(&self) -> FallbackLocation {
        FallbackLocation::new(self.external_cache_dir.clone(), self.cache_dir.clone())
    }
}

impl Display for Cfg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.env_message)
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir().unwrap_or_else(std::env::temp_dir)
}
