// Client-side session storage.
// Holds the currently authenticated user, mirrored to a JSON file so the
// session survives restarts. There is exactly one current user per process;
// absence means unauthenticated.

use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::warn;

use crate::app::models::User;

pub struct SessionStore {
    path: PathBuf,
    current: RwLock<Option<User>>,
}

impl SessionStore {
    // Read back a previously persisted session. A missing or corrupt file
    // must never take the app down; it just means "logged out".
    pub fn load(path: PathBuf) -> Self {
        let current = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(err) => {
                    warn!(path = %path.display(), %err, "discarding corrupt session file");
                    None
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), %err, "could not read session file");
                None
            }
        };

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    // Replace the current session and persist it.
    pub fn set_current_user(&self, user: User) {
        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    warn!(path = %self.path.display(), %err, "could not persist session");
                }
            }
            Err(err) => warn!(%err, "could not serialize session"),
        }
        *self.current.write() = Some(user);
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    // Clear both the in-memory and the persisted session.
    pub fn logout(&self) {
        *self.current.write() = None;
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "could not remove session file");
            }
        }
    }
}
