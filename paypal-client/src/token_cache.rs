//! On-disk access token cache.
//!
//! Tokens are stored as a JSON object keyed by client id so several
//! applications can share one cache file.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use paypal_types::AccessToken;

/// File-backed token store.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the cached token for `client_id`, expired or not.
    ///
    /// A missing or unreadable file is treated as an empty cache.
    pub async fn load(&self, client_id: &str) -> Option<AccessToken> {
        self.read_all().await.remove(client_id)
    }

    /// Stores `token` under `client_id`, keeping other entries.
    pub async fn store(&self, client_id: &str, token: &AccessToken) -> io::Result<()> {
        let mut entries = self.read_all().await;
        entries.insert(client_id.to_string(), token.clone());
        self.write_all(&entries).await
    }

    /// Drops the entry for `client_id`, leaving other entries in place.
    pub async fn evict(&self, client_id: &str) -> io::Result<()> {
        let mut entries = self.read_all().await;
        if entries.remove(client_id).is_none() {
            return Ok(());
        }
        self.write_all(&entries).await
    }

    async fn write_all(&self, entries: &HashMap<String, AccessToken>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(entries).map_err(io::Error::other)?;
        tokio::fs::write(&self.path, json).await
    }

    async fn read_all(&self) -> HashMap<String, AccessToken> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt token cache {}: {}", self.path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Cannot read token cache {}: {}", self.path.display(), e);
                HashMap::new()
            }
        }
    }
}
