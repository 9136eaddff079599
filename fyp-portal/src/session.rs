//! Process-wide session context
//!
//! Holds the bearer credential and the signed-in user. Created once at
//! startup (hydrated from the credential store, if any) and shared by `Arc`
//! with the API client and the views. Torn down on logout or when the
//! backend rejects the credential.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fyp_common::events::{EventBus, PortalEvent};
use fyp_common::models::UserProfile;
use fyp_common::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PortalError, Result};

/// Credential plus the user it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

/// Where a session survives between runs
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Nothing persisted: the session lives and dies with the process
#[derive(Debug, Default)]
pub struct MemoryStore;

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<Session>> {
        Ok(None)
    }

    fn save(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// JSON file, written atomically (temp + rename), owner-only on Unix
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn storage_err(e: impl std::fmt::Display) -> PortalError {
    PortalError::Storage(e.to_string())
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path).map_err(storage_err)?;
        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file is treated as "signed out", not as fatal
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let json = serde_json::to_string_pretty(session).map_err(storage_err)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(storage_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .map_err(storage_err)?;
        }

        std::fs::rename(&tmp, &self.path).map_err(storage_err)?;
        debug!("Session saved to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err(e)),
        }
    }
}

/// The single session context of the process
pub struct SessionContext {
    store: Box<dyn CredentialStore>,
    current: RwLock<Option<Session>>,
    events: EventBus,
}

impl SessionContext {
    /// Initialise from the store; a stored credential is restored as-is
    pub fn hydrate(store: Box<dyn CredentialStore>, events: EventBus) -> Result<Self> {
        let restored = store.load()?;
        if let Some(session) = &restored {
            info!(user_id = session.user.user_id, role = %session.user.role, "Restored session");
            events.emit_lossy(PortalEvent::SessionStarted {
                user_id: session.user.user_id,
                role: session.user.role,
                timestamp: fyp_common::time::now(),
            });
        }
        Ok(Self {
            store,
            current: RwLock::new(restored),
            events,
        })
    }

    /// Memory-only context with nobody signed in
    pub fn in_memory(events: EventBus) -> Self {
        Self {
            store: Box::new(MemoryStore),
            current: RwLock::new(None),
            events,
        }
    }

    /// Install a freshly issued credential
    pub fn begin(&self, session: Session) -> Result<()> {
        self.store.save(&session)?;
        info!(user_id = session.user.user_id, role = %session.user.role, "Signed in");
        self.events.emit_lossy(PortalEvent::SessionStarted {
            user_id: session.user.user_id,
            role: session.user.role,
            timestamp: fyp_common::time::now(),
        });
        if let Ok(mut current) = self.current.write() {
            *current = Some(session);
        }
        Ok(())
    }

    /// Drop the credential from memory and storage
    pub fn end(&self, reason: &str) {
        let had_session = match self.current.write() {
            Ok(mut current) => current.take().is_some(),
            Err(_) => false,
        };
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored session: {}", e);
        }
        if had_session {
            info!(reason, "Session ended");
            self.events.emit_lossy(PortalEvent::SessionEnded {
                reason: reason.to_string(),
                timestamp: fyp_common::time::now(),
            });
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.token.clone()))
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.current
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.user.clone()))
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    /// Signed-in user, or `SessionExpired`
    pub fn require_user(&self) -> Result<UserProfile> {
        self.user().ok_or(PortalError::SessionExpired)
    }

    pub fn is_active(&self) -> bool {
        self.token().is_some()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
