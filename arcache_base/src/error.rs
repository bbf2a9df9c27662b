// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub use int_enum::IntEnum;
use std::error::Error;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Cache error codes.
///
/// Negative codes are failures of collaborators around the cache,
/// positive ones come from the cache itself.
#[repr(i16)]
#[derive(Debug, PartialEq, PartialOrd, Copy, Clone, IntEnum)]
pub enum ErrorCode {
    Interrupted = -3,
    FetchFailed = -2,
    Unknown = -1,

    CorruptEntry = 1,
    IoFailure = 2,
    NotInitialized = 3,
    InvalidKey = 4,
}

/// A cache error with a status code and a human readable message.
#[derive(PartialEq, Debug, Clone)]
pub struct CacheError {
    /// The error code.
    pub status: ErrorCode,

    /// The human readable message.
    pub message: String,
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "[{:?}] {}", self.status, self.message)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "{}", *self as i16)
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError {
            status: ErrorCode::IoFailure,
            message: err.to_string(),
        }
    }
}

impl Error for CacheError {}

impl CacheError {
    pub fn new(status: ErrorCode, message: &str) -> Self {
        CacheError {
            status,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> ErrorCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The header of a cache file is unreadable or the file is shorter than its header.
    pub fn corrupt_entry(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::CorruptEntry, msg)
    }

    /// A file could not be created, written, renamed or deleted.
    pub fn io_failure(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::IoFailure, msg)
    }

    /// The cache was used before its index was recovered from disk.
    pub fn not_initialized(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::NotInitialized, msg)
    }

    /// The key can't be stored in a single header line.
    pub fn invalid_key(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::InvalidKey, msg)
    }

    /// The downloader failed to fetch a payload.
    pub fn fetch_failed(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::FetchFailed, msg)
    }

    /// A background task was cancelled or panicked.
    pub fn interrupted(msg: &str) -> CacheError {
        CacheError::new(ErrorCode::Interrupted, msg)
    }
}

#[macro_export]
macro_rules! corrupt_entry {
    ($msg:expr, $($arg:tt)*) => {
        CacheError::corrupt_entry(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        CacheError::corrupt_entry($msg)
    };
}

#[macro_export]
macro_rules! io_failure {
    ($msg:expr, $($arg:tt)*) => {
        CacheError::io_failure(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        CacheError::io_failure($msg)
    };
}

#[macro_export]
macro_rules! not_initialized {
    ($msg:expr, $($arg:tt)*) => {
        CacheError::not_initialized(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        CacheError::not_initialized($msg)
    };
}

#[macro_export]
macro_rules! invalid_key {
    ($msg:expr, $($arg:tt)*) => {
        CacheError::invalid_key(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        CacheError::invalid_key($msg)
    };
}

#[macro_export]
macro_rules! fetch_failed {
    ($msg:expr, $($arg:tt)*) => {
        CacheError::fetch_failed(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        CacheError::fetch_failed($msg)
    };
}
