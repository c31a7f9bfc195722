//! Provider API key storage.
//!
//! Keys are addressed by upper-cased provider name. Storing an empty token
//! deletes the entry, so callers never see `Some("")`.

pub mod handlers;

use std::collections::HashMap;
use std::io::ErrorKind;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("token store is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the stored token, or `None` when nothing is saved.
    async fn get_token(&self, provider: &str) -> Result<Option<String>, TokenStoreError>;

    /// Saves `token` for `provider`; an empty token removes it.
    async fn set_token(&self, provider: &str, token: &str) -> Result<(), TokenStoreError>;
}

pub fn normalize_provider(provider: &str) -> String {
    provider.trim().to_uppercase()
}

/// Apply a set/delete to an in-memory token map.
fn apply_update(tokens: &mut HashMap<String, String>, provider: &str, token: &str) {
    let key = normalize_provider(provider);
    if token.is_empty() {
        tokens.remove(&key);
    } else {
        tokens.insert(key, token.to_string());
    }
}

/// Ephemeral store, lost on restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecretStore for MemoryTokenStore {
    async fn get_token(&self, provider: &str) -> Result<Option<String>, TokenStoreError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(&normalize_provider(provider)).cloned())
    }

    async fn set_token(&self, provider: &str, token: &str) -> Result<(), TokenStoreError> {
        let mut tokens = self.tokens.write().await;
        apply_update(&mut tokens, provider, token);
        Ok(())
    }
}

/// Owner read/write only; the file holds provider API keys.
#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// Persists tokens as a JSON object on disk.
///
/// The whole file is rewritten on every change via a temp file + rename.
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, String>, TokenStoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, tokens: &HashMap<String, String>) -> Result<(), TokenStoreError> {
        let bytes = serde_json::to_vec_pretty(tokens)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(KEY_FILE_MODE);
        let mut file = options.open(&tmp).await?;
        // `mode` only applies on creation; a leftover temp file keeps its bits.
        #[cfg(unix)]
        file.set_permissions(std::fs::Permissions::from_mode(KEY_FILE_MODE))
            .await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileTokenStore {
    async fn get_token(&self, provider: &str) -> Result<Option<String>, TokenStoreError> {
        let tokens = self.load().await?;
        Ok(tokens.get(&normalize_provider(provider)).cloned())
    }

    async fn set_token(&self, provider: &str, token: &str) -> Result<(), TokenStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut tokens = self.load().await?;
        apply_update(&mut tokens, provider, token);
        self.save(&tokens).await
    }
}
