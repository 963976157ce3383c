//! Durable single-record cache for the current token.

use crate::auth::Token;
use crate::errors::{BlackboardError, BlackboardErrorKind, BlackboardResult};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persistence seam for the current token.
///
/// `load` distinguishes an absent record (`Ok(None)`) from an unreadable one
/// (`Err`); the token authority collapses both into a cache miss.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Loads the cached token. `Ok(None)` means no record exists.
    async fn load(&self) -> BlackboardResult<Option<Token>>;

    /// Persists the token, replacing any previous record.
    async fn save(&self, token: &Token) -> BlackboardResult<()>;
}

/// File-backed [`TokenStore`] holding one serialized token.
///
/// Writes go to a sibling temp file first and are renamed over the target, so
/// a concurrent reader never observes a partial record. The file and its
/// parent directory are restricted to the owning account on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store at the provided path. The file is not touched until
    /// the first `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_exists(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> BlackboardResult<Option<Token>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BlackboardError::new(
                    BlackboardErrorKind::Unknown,
                    format!("failed to read token cache {}", self.path.display()),
                )
                .with_source(e))
            }
        };

        let token = serde_json::from_slice(&bytes).map_err(|e| {
            BlackboardError::deserialization(format!(
                "failed to decode token cache {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        Ok(Some(token))
    }

    async fn save(&self, token: &Token) -> BlackboardResult<()> {
        Self::ensure_parent_exists(&self.path).map_err(|e| {
            BlackboardError::new(
                BlackboardErrorKind::Unknown,
                format!(
                    "failed to create token cache directory for {}",
                    self.path.display()
                ),
            )
            .with_source(e)
        })?;

        let serialized = serde_json::to_vec(token).map_err(|e| {
            BlackboardError::new(
                BlackboardErrorKind::Unknown,
                "failed to serialize token for caching",
            )
            .with_source(e)
        })?;

        let mut tmp_path = self.path.clone();
        tmp_path.set_extension("tmp");

        fs::write(&tmp_path, &serialized).map_err(|e| {
            BlackboardError::new(
                BlackboardErrorKind::Unknown,
                format!("failed to write {}", tmp_path.display()),
            )
            .with_source(e)
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                BlackboardError::new(
                    BlackboardErrorKind::Unknown,
                    format!("failed to restrict permissions on {}", tmp_path.display()),
                )
                .with_source(e)
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            BlackboardError::new(
                BlackboardErrorKind::Unknown,
                format!("failed to replace {}", self.path.display()),
            )
            .with_source(e)
        })
    }
}

/// In-memory [`TokenStore`] for tests and short-lived processes.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl MemoryTokenStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a token.
    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> BlackboardResult<Option<Token>> {
        Ok(self.token.lock().unwrap().clone())
    }

    async fn save(&self, token: &Token) -> BlackboardResult<()> {
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenResponse;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn sample_token() -> Token {
        Token::from_response(
            TokenResponse {
                access_token: "cached-token".to_string(),
                token_type: "bearer".to_string(),
                refresh_token: Some("refresh".to_string()),
                expires_in: 3600,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("data").join(".token.json"));
        let token = sample_token();

        store.save(&token).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, token);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_miss_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("absent.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, b"not json at all").unwrap();

        let store = FileTokenStore::new(&path);
        let err = store.load().await.unwrap_err();
        assert_eq!(err.kind(), BlackboardErrorKind::DeserializationError);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(".token.json"));

        let first = sample_token();
        store.save(&first).await.unwrap();

        let mut second = sample_token();
        second.access_token = "replacement".to_string();
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "replacement");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cache_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("data").join(".token.json"));
        store.save(&sample_token()).await.unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
