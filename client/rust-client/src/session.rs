use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{AuthTokens, UserRecord, UserRole};

/// Tokens and the server's view of the player.
///
/// `score` and `coins` inside `user` are a cache of server state: they only
/// change when a confirmed API response carries new values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSession {
    pub tokens: Option<AuthTokens>,
    pub user: Option<UserRecord>,
}

/// Cloneable handle to the one session shared by the transport, the services
/// and the round controller.
///
/// Anyone may read it. Writes are crate-private: auth writes tokens and the
/// user record, the round controller writes the mirrored balances.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<PlayerSession>>,
    store: Option<Arc<PathBuf>>,
}

impl From<PlayerSession> for SharedSession {
    fn from(session: PlayerSession) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
            store: None,
        }
    }
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the session persisted at `path` (if any) and keeps writing
    /// changes back to it.
    pub fn restore(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load_session_file(&path).unwrap_or_default();

        if session.tokens.is_some() {
            tracing::info!("Restored session from {}", path.display());
        }

        Self {
            inner: Arc::new(RwLock::new(session)),
            store: Some(Arc::new(path)),
        }
    }

    pub fn snapshot(&self) -> PlayerSession {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().tokens.is_some()
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().tokens.as_ref().map(|t| t.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().tokens.as_ref().map(|t| t.refresh.clone())
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.read().user.clone()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.read().user.as_ref().map(|u| u.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }

    pub fn coins(&self) -> u32 {
        self.read().user.as_ref().map(|u| u.coins).unwrap_or(0)
    }

    pub fn score(&self) -> i64 {
        self.read().user.as_ref().map(|u| u.score).unwrap_or(0)
    }

    pub(crate) fn establish(&self, tokens: AuthTokens, user: UserRecord) {
        self.update(|session| {
            session.tokens = Some(tokens);
            session.user = Some(user);
        });
    }

    pub(crate) fn set_access_token(&self, access: String) {
        self.update(|session| {
            if let Some(tokens) = session.tokens.as_mut() {
                tokens.access = access;
            }
        });
    }

    pub(crate) fn mirror_coins(&self, coins: u32) {
        self.update(|session| {
            if let Some(user) = session.user.as_mut() {
                user.coins = coins;
            }
        });
    }

    pub(crate) fn mirror_totals(&self, score: i64, coins: u32) {
        self.update(|session| {
            if let Some(user) = session.user.as_mut() {
                user.score = score;
                user.coins = coins;
            }
        });
    }

    pub(crate) fn clear(&self) {
        *self.write() = PlayerSession::default();

        if let Some(path) = self.store.as_deref() {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove session file {}: {}", path.display(), e);
                }
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut PlayerSession)) {
        let snapshot = {
            let mut guard = self.write();
            f(&mut guard);
            guard.clone()
        };
        self.persist(&snapshot);
    }

    fn persist(&self, session: &PlayerSession) {
        let Some(path) = self.store.as_deref() else {
            return;
        };

        let result = serde_json::to_vec_pretty(session)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(path, bytes));

        if let Err(e) = result {
            tracing::warn!("Failed to persist session to {}: {}", path.display(), e);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PlayerSession> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlayerSession> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_session_file(path: &Path) -> Option<PlayerSession> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!("Failed to read session file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!("Ignoring corrupt session file {}: {}", path.display(), e);
            None
        }
    }
}
