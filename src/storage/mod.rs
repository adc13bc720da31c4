//! Local static storage for the company logo.
//!
//! The logo fetched from upstream is written under the storage root, which
//! the HTTP server also serves, and its public URL is handed back to the
//! client.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::StorageConfig;

/// Location of the logo relative to the storage root.
pub const LOGO_PATH: &str = "assets/img/logos/company_logo.jpg";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct LogoStorage {
    root: PathBuf,
    public_url: String,
}

impl LogoStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.root.clone(), config.public_url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the logo, replacing any previous one, and return its URL.
    pub async fn save_logo(&self, image: &[u8]) -> Result<String, StorageError> {
        let path = self.root.join(LOGO_PATH);
        let wrap = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
        }
        tokio::fs::write(&path, image).await.map_err(wrap)?;

        tracing::debug!(path = %path.display(), bytes = image.len(), "Company logo stored");
        Ok(self.logo_url())
    }

    /// Public URL of the stored logo.
    pub fn logo_url(&self) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), LOGO_PATH)
    }
}
