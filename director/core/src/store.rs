//! Session Persistence
//!
//! Remembers the server-assigned session id across launches so a player can
//! pick up where they left off. Persistence is a capability handed to the
//! Director, never reached for implicitly: construction decides whether
//! sessions survive a restart.
//!
//! Persistence failures are logged and swallowed. A broken store degrades to
//! "always a fresh session", it never takes the game down.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the last session id is remembered between runs
pub trait SessionStore: Send + Sync {
    /// The stored session id, if any
    fn get(&self) -> Option<String>;

    /// Remember a session id
    fn set(&self, session_id: &str);

    /// Forget the stored session id
    fn clear(&self);
}

/// File-backed session store
///
/// Stores the session id as a plain text file under the user's data
/// directory (or an explicit path).
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store under the platform data directory, e.g.
    /// `~/.local/share/teletale/session_id`
    ///
    /// Returns `None` when no data directory can be determined.
    #[must_use]
    pub fn default_location() -> Option<Self> {
        let dir = dirs::data_dir()?.join("teletale");
        Some(Self {
            path: dir.join("session_id"),
        })
    }

    /// Store at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let id = contents.trim();
                if id.is_empty() {
                    None
                } else {
                    Some(id.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read session store");
                None
            }
        }
    }

    fn set(&self, session_id: &str) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create session store directory");
                return;
            }
        }
        if let Err(e) = std::fs::write(&self.path, session_id) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write session store");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to clear session store");
            }
        }
    }
}

/// In-memory session store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a session id
    #[must_use]
    pub fn with_session(session_id: &str) -> Self {
        Self {
            slot: Mutex::new(Some(session_id.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    fn set(&self, session_id: &str) {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session_id.to_string());
    }

    fn clear(&self) {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}
