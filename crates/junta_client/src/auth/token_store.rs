use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use log::{debug, warn};

use crate::auth::session::Session;

const SESSION_FILE: &str = "session.json";

/// Owns the current session tokens.
///
/// Clone-shared; every clone sees swaps immediately. Sessions are mirrored
/// to `<data-dir>/session.json` so a restarted process resumes where it
/// left off. Lock sections are short and never held across an await.
#[derive(Debug, Clone)]
pub struct TokenStore {
    session: Arc<RwLock<Option<Session>>>,
    cache_path: PathBuf,
}

impl TokenStore {
    /// Create a store rooted at `data_dir`, loading a cached session if any.
    pub fn new(data_dir: PathBuf) -> Self {
        let cache_path = data_dir.join(SESSION_FILE);
        let session = if cache_path.exists() {
            match junta_core::paths::load_json::<Session>(&cache_path) {
                Ok(session) => {
                    debug!("Resumed cached session from {}", cache_path.display());
                    Some(session)
                }
                Err(e) => {
                    warn!("Discarding unreadable session cache: {e}");
                    let _ = std::fs::remove_file(&cache_path);
                    None
                }
            }
        } else {
            None
        };

        TokenStore {
            session: Arc::new(RwLock::new(session)),
            cache_path,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.refresh_token.clone())
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn has_session(&self) -> bool {
        self.read().is_some()
    }

    /// Swap in a new session and mirror it to disk.
    pub fn store(&self, session: Session) {
        if let Err(e) = junta_core::paths::save_json(&self.cache_path, &session) {
            warn!("Failed to cache session to disk: {e}");
        }
        *self.write() = Some(session);
    }

    /// Drop the session from memory and disk.
    pub fn clear(&self) {
        *self.write() = None;
        if self.cache_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.cache_path) {
                warn!("Failed to remove session cache: {e}");
            }
        }
        debug!("Session store cleared");
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }
}
