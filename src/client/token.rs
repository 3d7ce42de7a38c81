//! Bearer credential storage
//!
//! [`TokenStore`] keeps the active credential in memory and mirrors it into a
//! [`CredentialStore`]. Every operation holds one async mutex for its whole
//! duration, persistence included, so a logout cannot interleave with a fresh
//! login or a 401-triggered clear.

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ConfigError, Result};

/// Persistent backing for the credential
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Credential file contents
#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    token: String,
    saved_at: DateTime<Utc>,
}

/// YAML credential file, written with owner-only permissions
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub const FILE_NAME: &'static str = "credentials.yaml";

    /// Store the credential file inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let file: CredentialFile = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        Ok(Some(file.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(&CredentialFile {
            token: token.to_string(),
            saved_at: Utc::now(),
        })
        .map_err(|e| ConfigError::SaveError(e.to_string()))?;

        // Write then tighten permissions before anything else can read it
        std::fs::write(&self.path, contents)?;
        crate::config::restrict_permissions(&self.path)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local credential store (fixtures and tests)
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: StdMutex<Option<String>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().map(|t| t.clone()).unwrap_or_default())
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
        Ok(())
    }
}

#[derive(Default)]
struct TokenState {
    token: Option<String>,
    /// Whether `token` reflects the persisted copy
    loaded: bool,
}

/// The active bearer credential
pub struct TokenStore {
    state: Mutex<TokenState>,
    backend: Box<dyn CredentialStore>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn CredentialStore>) -> Self {
        Self {
            state: Mutex::new(TokenState::default()),
            backend,
        }
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryCredentialStore::default()))
    }

    /// Current credential, loading the persisted copy on first use
    pub async fn get(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            state.token = match self.backend.load() {
                Ok(token) => token,
                Err(e) => {
                    log::warn!("Failed to read stored credential: {}", e);
                    None
                }
            };
            state.loaded = true;
        }
        state.token.clone()
    }

    /// Persist and activate a credential
    ///
    /// The in-memory copy is only updated once the write has succeeded.
    pub async fn set(&self, token: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.loaded && state.token.as_deref() == Some(token) {
            return Ok(());
        }

        match self.backend.save(token) {
            Ok(()) => {
                state.token = Some(token.to_string());
                state.loaded = true;
                Ok(())
            }
            Err(e) => {
                // Fall back to whatever is actually persisted on next read
                state.loaded = false;
                state.token = None;
                Err(e)
            }
        }
    }

    /// Forget the credential in memory and on disk
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.remove_locked(&mut state)
    }

    /// Forget the credential only if it is still `token`
    ///
    /// Returns whether anything was cleared. A credential stored after
    /// `token` was read is left alone.
    pub async fn clear_if(&self, token: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.loaded {
            state.token = self.backend.load()?;
            state.loaded = true;
        }
        if state.token.as_deref() != Some(token) {
            return Ok(false);
        }
        self.remove_locked(&mut state).map(|()| true)
    }

    fn remove_locked(&self, state: &mut TokenState) -> Result<()> {
        state.token = None;
        match self.backend.remove() {
            Ok(()) => {
                state.loaded = true;
                Ok(())
            }
            Err(e) => {
                // The file may still be there; read it again next time
                state.loaded = false;
                Err(e)
            }
        }
    }

    /// Whether a credential is currently persisted
    pub async fn has(&self) -> bool {
        let _state = self.state.lock().await;
        matches!(self.backend.load(), Ok(Some(_)))
    }
}
