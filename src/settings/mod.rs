//! Runtime settings that the API may change (the company RUT).
//!
//! Handlers only see the [`SettingsStore`] trait; the server decides at
//! startup whether values live in memory or in an env file.

pub mod env_file;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

pub use env_file::EnvFileSettingsStore;

/// Settings key holding the company RUT.
pub const COMPANY_RUT: &str = "COMPANY_RUT";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to persist settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings key '{0}'")]
    InvalidKey(String),
}

/// Key/value settings shared by all requests.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Settings kept only for the life of the process.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        validate_key(key)?;
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), SettingsError> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !key.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(SettingsError::InvalidKey(key.to_string()))
    }
}
