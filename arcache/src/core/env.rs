// Copyright 2023-2025 ReductSoftware UG
// Licensed under the Business Source License 1.1

use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

/// Source of environment variables.
pub trait GetEnv {
    fn get(&self, key: &str) -> Result<String, VarError>;
}

/// Reads variables from the process environment.
#[derive(Default, Clone)]
pub struct StdEnvGetter;

impl GetEnv for StdEnvGetter {
    fn get(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

/// A helper class to read environment variables.
pub struct Env<EnvGetter: GetEnv> {
    getter: EnvGetter,
    message: String,
}

impl<EnvGetter: GetEnv> Env<EnvGetter> {
    pub fn new(getter: EnvGetter) -> Env<EnvGetter> {
        Env {
            getter,
            message: String::new(),
        }
    }

    /// Get a value from the environment.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to get.
    /// * `default_value` - The default value to return if the key is not found or invalid.
    ///
    /// # Returns
    ///
    /// The value of the environment variable.
    pub fn get<T: FromStr + Display>(&mut self, key: &str, default_value: T) -> T {
        match self.getter.get(key) {
            Ok(raw) => match raw.parse::<T>() {
                Ok(value) => {
                    self.record(key, &value, "");
                    value
                }
                Err(_) => {
                    self.record(key, &default_value, "(invalid)");
                    default_value
                }
            },
            Err(_) => {
                self.record(key, &default_value, "(default)");
                default_value
            }
        }
    }

    /// Get a value from the environment if it is set and valid.
    pub fn get_optional<T: FromStr + Display>(&mut self, key: &str) -> Option<T> {
        let raw = self.getter.get(key).ok()?;
        match raw.parse::<T>() {
            Ok(value) => {
                self.record(key, &value, "");
                Some(value)
            }
            Err(_) => {
                self.message
                    .push_str(&format!("\t{} = {} (invalid)\n", key, raw));
                None
            }
        }
    }

    /// Get pretty printed message.
    pub fn message(&self) -> &str {
        &self.message
    }

    fn record<T: Display>(&mut self, key: &str, value: &T, note: &str) {
        self.message
            .push_str(&format!("\t{} = {} {}\n", key, value, note));
    }
}
