//! Token persistence. The file store keeps `{ "token": "..." }` on disk so a
//! session survives restarts; the memory store is for tests and one-shot runs.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use domains::{Result, TokenStorage};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TokenError;

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> std::result::Result<Option<String>, TokenError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredToken = serde_json::from_str(&raw)?;
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    fn write(&self, token: &str) -> std::result::Result<(), TokenError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&StoredToken {
            token: token.to_string(),
        })?;
        fs::write(&self.path, body)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn get_token(&self) -> Option<SecretString> {
        match self.read() {
            Ok(token) => token.map(SecretString::from),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable token file");
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.write(token)?;
        debug!(path = %self.path.display(), "token stored");
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(TokenError::from(err).into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStorage {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get_token(&self) -> Option<SecretString> {
        self.token.lock().clone().map(SecretString::from)
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn file_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileTokenStorage::new(dir.path().join("nested/session.json"));

        assert!(storage.get_token().is_none());
        storage.set_token("a.b.c").unwrap();
        assert_eq!(storage.get_token().unwrap().expose_secret(), "a.b.c");

        storage.clear_token().unwrap();
        assert!(storage.get_token().is_none());
        // clearing twice is fine
        storage.clear_token().unwrap();
    }

    #[test]
    fn corrupt_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(FileTokenStorage::new(path).get_token().is_none());
    }

    #[test]
    fn memory_store_holds_one_token() {
        let storage = MemoryTokenStorage::with_token("x.y.z");
        assert_eq!(storage.get_token().unwrap().expose_secret(), "x.y.z");
        storage.clear_token().unwrap();
        assert!(storage.get_token().is_none());
    }
}
