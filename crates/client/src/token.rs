//! Bearer token persistence.
//!
//! The token is the only piece of client state that survives a restart.
//! [`FileTokenStore`] keeps it in a small JSON file; [`MemoryTokenStore`]
//! keeps it for the lifetime of the process only.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing a persisted token.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Filesystem operation failed.
    #[error("Token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Token file exists but is not valid JSON.
    #[error("Token file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory store's lock was poisoned.
    #[error("Token store lock poisoned")]
    Poisoned,
}

/// Storage for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Load the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError>;

    /// Persist a token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    /// Forget the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be modified.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

// =============================================================================
// File store
// =============================================================================

#[derive(Serialize, Deserialize)]
struct TokenFile<'a> {
    access_token: std::borrow::Cow<'a, str>,
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store at `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let file: TokenFile<'_> =
            serde_json::from_str(&raw).map_err(|source| TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        let token = file.access_token.trim();
        Ok((!token.is_empty()).then(|| SecretString::from(token.to_owned())))
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = TokenFile {
            access_token: std::borrow::Cow::Borrowed(token.expose_secret()),
        };
        let json = serde_json::to_string(&file).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_private(&self.path, json.as_bytes()).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Write `contents` to `path`, readable by the owner only on unix.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

// =============================================================================
// Memory store
// =============================================================================

/// Token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let guard = self.token.lock().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        let mut guard = self.token.lock().map_err(|_| TokenStoreError::Poisoned)?;
        *guard = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut guard = self.token.lock().map_err(|_| TokenStoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_token_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("the-shop-token-test-{}-{name}", std::process::id()))
            .join("token.json")
    }

    #[test]
    fn test_file_store_roundtrip_and_clear() {
        let path = temp_token_path("roundtrip");
        let store = FileTokenStore::new(&path);

        assert!(store.load().unwrap().is_none());

        store.save(&SecretString::from("tok-123")).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.expose_secret(), "tok-123");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_token_path("mode");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.save(&SecretString::from("tok-456")).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "tok-456");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let path = temp_token_path("corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(TokenStoreError::Corrupt { .. })
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_blank_token_is_none() {
        let path = temp_token_path("blank");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"access_token":"  "}"#).unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.load().unwrap().is_none());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::with_token("abc");
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "abc");
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.save(&SecretString::from("def")).unwrap();
        assert_eq!(store.load().unwrap().unwrap().expose_secret(), "def");
    }
}
