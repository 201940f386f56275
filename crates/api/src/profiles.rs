//! File-backed profile store.
//!
//! Profiles live in a JSON array on disk and are re-read on every lookup,
//! so edits to the file take effect without a restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use invoicer_core::error::CoreError;
use invoicer_core::profile::{find_profile, Profile};
use invoicer_engine::single::ProfileSource;

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up one profile by exact name.
    pub async fn find(&self, name: &str) -> Result<Option<Profile>, CoreError> {
        let profiles = self.load().await?;
        Ok(find_profile(&profiles, name).cloned())
    }
}

#[async_trait]
impl ProfileSource for ProfileStore {
    /// A missing file reads as no profiles.
    async fn load(&self) -> Result<Vec<Profile>, CoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Profiles file not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CoreError::Internal(format!(
                    "Failed to read profiles from {}: {e}",
                    self.path.display()
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            CoreError::Internal(format!(
                "Invalid profiles file {}: {e}",
                self.path.display()
            ))
        })
    }
}
