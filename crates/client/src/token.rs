//! Bearer token cache.
//!
//! The token obtained from the authorize call is kept in a [`TokenStore`]
//! together with its issue time. [`TokenCache`] hides tokens older than
//! the configured maximum age so that callers re-authorize.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tokens are valid server-side for a year; stop using them well before.
pub const DEFAULT_TOKEN_MAX_AGE: Duration = Duration::from_secs(300 * 24 * 60 * 60);

/// Errors from token persistence.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A bearer token and the moment it was issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl Token {
    /// Creates a token issued now.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }

    /// Returns `true` if the token is older than `max_age` at `now`.
    pub fn is_expired_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(self.issued_at) > max_age
    }
}

/// Storage for the single cached token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<Token>;
    fn save(&self, token: &Token) -> Result<(), TokenStoreError>;
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<Token> {
        self.token.read().unwrap().clone()
    }

    fn save(&self, token: &Token) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap() = None;
        Ok(())
    }
}

/// Token store persisted as a JSON file.
///
/// The token is cached in memory and written through on every change.
pub struct FileTokenStore {
    path: PathBuf,
    token: RwLock<Option<Token>>,
}

impl FileTokenStore {
    /// Creates a store at `path`, loading an existing token if present.
    pub fn new(path: PathBuf) -> Result<Self, TokenStoreError> {
        let token = load_token(&path)?;
        Ok(Self {
            path,
            token: RwLock::new(token),
        })
    }

    fn persist(&self) -> Result<(), TokenStoreError> {
        let token = self.token.read().unwrap();
        match &*token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, serde_json::to_string_pretty(token)?)?;

                // The file holds a credential.
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
                }
                debug!(path = %self.path.display(), "persisted token");
            }
            None => match std::fs::remove_file(&self.path) {
                Ok(()) => debug!(path = %self.path.display(), "removed token file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<Token> {
        self.token.read().unwrap().clone()
    }

    fn save(&self, token: &Token) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap() = Some(token.clone());
        self.persist()
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.token.write().unwrap() = None;
        self.persist()
    }
}

/// Loads a token from a JSON file on disk.
fn load_token(path: &Path) -> Result<Option<Token>, TokenStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    let token: Token = serde_json::from_str(&data)?;
    debug!(path = %path.display(), issued_at = %token.issued_at, "loaded token");
    Ok(Some(token))
}

/// Returns the default token file path.
pub fn default_token_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("filedrop").join("token.json"))
}

/// Returns the platform-specific config directory.
fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}

/// Age-checked view over a [`TokenStore`].
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn TokenStore>,
    max_age: Duration,
}

impl TokenCache {
    pub fn new(store: Arc<dyn TokenStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    /// Returns the cached token unless it is missing or too old.
    pub fn get(&self) -> Option<Token> {
        let token = self.store.load()?;
        if token.is_expired_at(self.max_age, Utc::now()) {
            debug!(issued_at = %token.issued_at, "cached token too old, ignoring");
            return None;
        }
        Some(token)
    }

    /// Stores `value` as a token issued now.
    pub fn set(&self, value: impl Into<String>) -> Result<Token, TokenStoreError> {
        let token = Token::new(value);
        self.store.save(&token)?;
        Ok(token)
    }

    /// Removes the cached token so the next pipeline re-authorizes.
    pub fn clear(&self) -> Result<(), TokenStoreError> {
        self.store.clear()
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
