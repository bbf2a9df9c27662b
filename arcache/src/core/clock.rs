// Copyright 2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use chrono::Utc;

/// Wall clock used to rank cache entries.
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_millis(&self) -> u64;
}

#[derive(Default, Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // clocks set before 1970 rank as 0 and rely on the +1 rule
        Utc::now().timestamp_millis().max(0) as u64
    }
}
