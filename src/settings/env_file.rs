//! Settings persisted in a `KEY=VALUE` env file.
//!
//! The file is read once at startup. `set` rewrites the matching line (or
//! appends one) and replaces the file atomically, so unrelated lines and
//! comments survive.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{validate_key, SettingsError, SettingsStore};

#[derive(Debug)]
pub struct EnvFileSettingsStore {
    path: PathBuf,
    // Guards both the cache and the file rewrite.
    values: Mutex<HashMap<String, String>>,
}

impl EnvFileSettingsStore {
    /// Open `path`; a missing file starts out empty and is created on the
    /// first `set`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "Settings file loaded");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Use `value` for `key` while the file has no entry for it. Nothing is
    /// written until `set`.
    pub fn with_default(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, value: &str) -> io::Result<()> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };

        let entry = format!("{}={}", key, quote(value));
        let mut replaced = false;
        let mut lines: Vec<String> = content
            .lines()
            .map(|line| {
                if !replaced && line_key(line) == Some(key) {
                    replaced = true;
                    entry.clone()
                } else {
                    line.to_string()
                }
            })
            .collect();
        if !replaced {
            lines.push(entry);
        }

        let mut output = lines.join("\n");
        output.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, output)?;
        fs::rename(&tmp, &self.path)
    }
}

impl SettingsStore for EnvFileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        validate_key(key)?;
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        self.persist(key, value)?;
        values.insert(key.to_string(), value.to_string());
        tracing::info!(key, path = %self.path.display(), "Setting persisted");
        Ok(())
    }
}

fn line_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.split_once('=').map(|(key, _)| key.trim())
}

fn parse(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let key = line_key(line)?;
            let (_, raw) = line.split_once('=')?;
            Some((key.to_string(), unquote(raw.trim())))
        })
        .collect()
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '='));
    if needs_quotes {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}
