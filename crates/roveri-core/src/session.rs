//! Client-side session state, persisted so a restart keeps the user signed in.
//!
//! Only the identity and the short-lived access token are stored here. The
//! refresh credential stays in the transport's cookie jar and is never read.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::models::User;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.access_token.is_none()
    }
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> io::Result<Option<Session>>;
    fn persist(&self, session: &Session) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// JSON file store, by default at `<config_dir>/roveri/session.json`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::config_dir()?.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> io::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                // A corrupt file is treated as signed out.
                warn!(path = %self.path.display(), %error, "discarding unreadable session file");
                Ok(None)
            }
        }
    }

    fn persist(&self, session: &Session) -> io::Result<()> {
        if session.is_empty() {
            return self.clear();
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(session).map_err(io::Error::other)?;
        fs::write(&self.path, raw)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
            _ => Ok(()),
        }
    }
}

/// Volatile store; nothing survives the process.
#[derive(Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            saved: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> io::Result<Option<Session>> {
        Ok(lock(&self.saved).clone())
    }

    fn persist(&self, session: &Session) -> io::Result<()> {
        *lock(&self.saved) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *lock(&self.saved) = None;
        Ok(())
    }
}

/// The one live session of a client. Cloning shares the same state.
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<Session>>,
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let initial = store.load().unwrap_or_else(|error| {
            warn!(%error, "failed to load saved session");
            None
        });
        Self {
            state: Arc::new(Mutex::new(initial.unwrap_or_default())),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    pub fn snapshot(&self) -> Session {
        lock(&self.state).clone()
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.state).user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        lock(&self.state).access_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).user.is_some()
    }

    pub fn set_user(&self, user: Option<User>) {
        self.update(|session| session.user = user);
    }

    pub fn set_access_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.update(|session| session.access_token = Some(token));
    }

    /// Drop identity and credentials wholesale.
    pub fn clear(&self) {
        *lock(&self.state) = Session::default();
        if let Err(error) = self.store.clear() {
            warn!(%error, "failed to clear saved session");
        }
    }

    fn update(&self, mutate: impl FnOnce(&mut Session)) {
        let snapshot = {
            let mut guard = lock(&self.state);
            mutate(&mut guard);
            guard.clone()
        };
        if let Err(error) = self.store.persist(&snapshot) {
            warn!(%error, "failed to persist session");
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> User {
        User {
            id: 1,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            is_staff: false,
            role: None,
        }
    }

    #[test]
    fn file_store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roveri").join("session.json");

        let handle = SessionHandle::new(Arc::new(FileSessionStore::new(&path)));
        assert!(!handle.is_authenticated());
        handle.set_user(Some(ana()));
        handle.set_access_token("access-1");
        assert!(path.exists());

        let reloaded = SessionHandle::new(Arc::new(FileSessionStore::new(&path)));
        assert_eq!(reloaded.user(), Some(ana()));
        assert_eq!(reloaded.access_token().as_deref(), Some("access-1"));
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let handle = SessionHandle::new(Arc::new(FileSessionStore::new(&path)));
        handle.set_user(Some(ana()));
        handle.set_access_token("access-1");

        handle.clear();
        assert!(handle.snapshot().is_empty());
        assert!(!path.exists());
        // Clearing twice is fine.
        handle.clear();
    }

    #[test]
    fn corrupt_file_loads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let handle = SessionHandle::new(Arc::new(FileSessionStore::new(&path)));
        assert!(handle.snapshot().is_empty());
    }

    #[test]
    fn clones_share_state() {
        let handle = SessionHandle::in_memory();
        let other = handle.clone();
        other.set_access_token("shared");
        assert_eq!(handle.access_token().as_deref(), Some("shared"));
    }
}
