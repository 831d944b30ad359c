//! Durable storage for the session token.
//!
//! DESIGN
//! ======
//! One token per profile, stored as the whole content of a single file.
//! Writes go to a uniquely named sibling and are renamed into place, so
//! concurrent writers resolve to last-write-wins without torn files.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use uuid::Uuid;

use crate::net::types::SessionToken;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token storage io failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("token storage lock poisoned")]
    Poisoned,
}

/// Key-value slot holding at most one token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, `None` when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SessionToken>, StoreError>;

    /// Replace the persisted token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &SessionToken) -> Result<(), StoreError>;

    /// Remove the persisted token. Removing an absent token succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SessionToken>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(SessionToken::new(&raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, token: &SessionToken) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "token".into(), |name| name.to_string_lossy().into_owned());
        let staging = self.path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        std::fs::write(&staging, token.expose()).map_err(|e| self.io_error(e))?;
        restrict_permissions(&staging);
        if let Err(e) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            return Err(self.io_error(e));
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(error = %e, path = %path.display(), "failed to restrict token file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<SessionToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: SessionToken) -> Self {
        Self { slot: Mutex::new(Some(token)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SessionToken>, StoreError> {
        Ok(self.slot.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn save(&self, token: &SessionToken) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "token_store_test.rs"]
mod tests;
