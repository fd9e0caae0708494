//! Per-profile session identity.
//!
//! The backend partitions uploaded documents and chat memory by an opaque
//! session id that the client generates and owns. The id lives in a small
//! file so it survives restarts, and is thrown away only on explicit reset.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use uuid::Uuid;

/// Opaque session identifier sent with every backend call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First block of the id, for compact display
    pub fn short(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the session id is persisted between runs
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Stores the id as a single line in a file
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/resume-analyzer/session_id`
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine local data directory"))?;

        Ok(Self::new(data_dir.join("resume-analyzer").join("session_id")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(content))
    }

    fn save(&mut self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, used for `--ephemeral` runs and tests
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    value: Option<String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.clone())
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.value = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.value = None;
        Ok(())
    }
}

/// Hands out the current session token, creating it lazily
pub struct SessionIdentity {
    store: Box<dyn SessionStore>,
    current: Option<SessionToken>,
    // Set by reset so a stored value that failed to clear is never reused
    discarded: bool,
}

impl SessionIdentity {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            current: None,
            discarded: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySessionStore::new()))
    }

    /// Return the active token, generating and persisting one if none exists.
    ///
    /// Storage problems never surface here: they are logged and the
    /// in-memory token stays authoritative for the rest of the process.
    pub fn get_session_id(&mut self) -> SessionToken {
        if let Some(token) = &self.current {
            return token.clone();
        }

        let stored = match self.store.load() {
            Ok(_) if self.discarded => None,
            Ok(value) => value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored session id: {e:#}");
                None
            }
        };

        let token = match stored {
            Some(value) => SessionToken(value),
            None => {
                let token = SessionToken::generate();
                if let Err(e) = self.store.save(token.as_str()) {
                    tracing::warn!("Failed to persist session id: {e:#}");
                }
                tracing::info!(session = %token, "Started new session");
                token
            }
        };

        self.discarded = false;
        self.current = Some(token.clone());
        token
    }

    /// Forget the current token. The next `get_session_id` starts a new one.
    pub fn reset_session_id(&mut self) {
        if let Some(old) = self.current.take() {
            tracing::info!(session = %old, "Resetting session");
        }
        self.discarded = true;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session id: {e:#}");
        }
    }
}
