// Copyright 2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::prelude::{DateTime, Utc};
use log::{warn, Level, LevelFilter, Log, Metadata, Record};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{LazyLock, RwLock};

static LOGGER: Logger = Logger;

/// Level per module path, e.g. `arcache/cache` => DEBUG. The empty path is the root.
static LEVELS: LazyLock<RwLock<BTreeMap<String, Level>>> =
    LazyLock::new(|| RwLock::new(BTreeMap::new()));

/// Process logger writing to stderr, so that the stdout of the CLI stays clean.
pub struct Logger;

impl Logger {
    /// Initialize the logger.
    ///
    /// # Arguments
    ///
    /// * `levels` - Comma separated levels, e.g. `INFO,arcache/cache=DEBUG`.
    ///   A level without a path applies to everything not matched by a more specific path.
    pub fn init(levels: &str) {
        let mut invalid = Vec::new();
        let mut parsed = BTreeMap::new();
        parsed.insert(String::new(), Level::Info);

        for item in levels.split(',').filter(|s| !s.trim().is_empty()) {
            let (path, level) = match item.split_once('=') {
                Some((path, level)) => (path.trim(), level.trim()),
                None => ("", item.trim()),
            };

            match parse_level(level) {
                Some(level) => {
                    parsed.insert(path.to_string(), level);
                }
                None => invalid.push(level.to_string()),
            }
        }

        let max_level = parsed.values().max().copied().unwrap_or(Level::Info);
        *LEVELS.write().unwrap() = parsed;

        log::set_logger(&LOGGER).ok();
        log::set_max_level(max_level.to_level_filter());

        for level in invalid {
            warn!("Invalid log level: {}, ignored", level);
        }
    }

    /// Current max level, mostly for diagnostics.
    pub fn max_level() -> LevelFilter {
        log::max_level()
    }

    fn level_for(target: &str) -> Level {
        let target = target.replace("::", "/");
        let levels = LEVELS.read().unwrap();
        // longest path first, the root (empty) path comes last
        levels
            .iter()
            .rev()
            .find(|(path, _)| target.starts_with(path.as_str()))
            .map(|(_, level)| *level)
            .unwrap_or(Level::Info)
    }
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_uppercase().as_str() {
        "TRACE" => Some(Level::Trace),
        "DEBUG" => Some(Level::Debug),
        "INFO" => Some(Level::Info),
        "WARN" => Some(Level::Warn),
        "ERROR" => Some(Level::Error),
        _ => None,
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Self::level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now: DateTime<Utc> = Utc::now();
        let file = match record.file() {
            Some(file) => file.split_once("src/").map(|(_, f)| f).unwrap_or(file),
            None => "(unknown)",
        };
        let package = record
            .target()
            .split_once(':')
            .map(|(p, _)| p)
            .unwrap_or(record.target());

        let _ = writeln!(
            std::io::stderr().lock(),
            "{} ({:>5}) [{}] -- {}/{}:{} {}",
            now.format("%Y-%m-%d %H:%M:%S.%3f"),
            thread_id::get() % 100000,
            record.level(),
            package,
            file,
            record.line().unwrap_or(0),
            record.args(),
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
