use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File-backed bearer token storage.
///
/// The token survives process restarts and is removed only by an explicit
/// logout or an observed authorization failure. No expiry is checked locally;
/// a dead token is only discovered when the backend rejects it.
pub struct SessionStore {
    path: PathBuf,
    token: Mutex<Option<String>>,
}

impl SessionStore {
    /// Opens the store, loading any token persisted by a previous run.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let token = std::fs::read_to_string(&path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|t| !t.is_empty());
        Self {
            path,
            token: Mutex::new(token),
        }
    }

    pub fn set(&self, token: &str) -> Result<()> {
        std::fs::write(&self.path, token)
            .with_context(|| format!("persisting token to {}", self.path.display()))?;
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_string());
        }
        Ok(())
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn clear(&self) -> Result<()> {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("removing token file {}", self.path.display()))
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}
