use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::tprintln;

use super::principal::Principal;
use super::storage::{FileStorage, SessionStorage, StorageError};

pub type SessionToken = String;

/// Who is logged in and with which credential. Token and principal only ever
/// exist together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub principal: Principal,
}

impl Session {
    pub fn is_authenticated(&self) -> bool { !self.token.is_empty() }
}

/// Immutable view of the store at one instant. Cheap to clone.
pub type SessionSnapshot = Option<Arc<Session>>;

pub const PERSIST_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default)]
    user: Option<Principal>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "isAuthenticated")]
    is_authenticated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedEnvelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

pub fn encode_session(session: Option<&Session>) -> Result<String, StorageError> {
    let state = match session {
        Some(s) => PersistedState { user: Some(s.principal.clone()), token: Some(s.token.clone()), is_authenticated: s.is_authenticated() },
        None => PersistedState { user: None, token: None, is_authenticated: false },
    };
    serde_json::to_string(&PersistedEnvelope { state, version: PERSIST_VERSION })
        .map_err(|e| StorageError::Malformed(e.to_string()))
}

/// Decode a persisted session. `isAuthenticated` is ignored and recomputed;
/// a token without a user (or the reverse) is rejected as malformed.
pub fn decode_session(raw: &str) -> Result<Option<Session>, StorageError> {
    let env: PersistedEnvelope = serde_json::from_str(raw).map_err(|e| StorageError::Malformed(e.to_string()))?;
    let token = env.state.token.filter(|t| !t.is_empty());
    match (token, env.state.user) {
        (Some(token), Some(principal)) => Ok(Some(Session { token, principal })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(StorageError::Malformed("token without user".into())),
        (None, Some(_)) => Err(StorageError::Malformed("user without token".into())),
    }
}

/// Process-wide holder of the current session.
///
/// Reads are synchronous snapshots. The only mutations are `set_auth` and
/// `logout`; both replace the whole session. Writers serialize on
/// `write_order`, which is held across the swap and the storage write so the
/// persisted copy always matches the last swap. `current` is write-locked
/// only for the swap itself, never across disk I/O.
pub struct SessionStore {
    current: RwLock<SessionSnapshot>,
    write_order: Mutex<()>,
    changes: watch::Sender<SessionSnapshot>,
    storage: Option<Arc<dyn SessionStorage>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl SessionStore {
    /// Store without persistence.
    pub fn in_memory() -> Self {
        let (changes, _) = watch::channel(None);
        Self { current: RwLock::new(None), write_order: Mutex::new(()), changes, storage: None }
    }

    /// Store backed by `storage`, rehydrated from whatever it holds.
    pub fn open(storage: Arc<dyn SessionStorage>) -> Self {
        let initial = Self::rehydrate(storage.as_ref());
        let (changes, _) = watch::channel(initial.clone());
        Self { current: RwLock::new(initial), write_order: Mutex::new(()), changes, storage: Some(storage) }
    }

    pub fn from_config(cfg: &ClientConfig) -> Self {
        match &cfg.session_file {
            Some(path) => Self::open(Arc::new(FileStorage::new(path.clone()))),
            None => Self::in_memory(),
        }
    }

    fn rehydrate(storage: &dyn SessionStorage) -> SessionSnapshot {
        let raw = match storage.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(target: "session", "could not read persisted session: {}", e);
                return None;
            }
        };
        match decode_session(&raw) {
            Ok(Some(s)) => {
                debug!(target: "session", "rehydrated session for user id={}", s.principal.id);
                Some(Arc::new(s))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(target: "session", "discarding persisted session: {}", e);
                if let Err(e) = storage.clear() {
                    warn!(target: "session", "could not clear discarded session: {}", e);
                }
                None
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot { self.current.read().clone() }

    pub fn token(&self) -> Option<SessionToken> {
        self.current.read().as_ref().map(|s| s.token.clone())
    }

    pub fn principal(&self) -> Option<Principal> {
        self.current.read().as_ref().map(|s| s.principal.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().as_ref().map(|s| s.is_authenticated()).unwrap_or(false)
    }

    /// Replace the whole session. The principal is normalized by its `Into`
    /// conversion before it gets here. An empty token is refused so a
    /// principal can never be stored without a credential.
    pub fn set_auth<P, T>(&self, principal: P, token: T) -> AppResult<()>
    where
        P: Into<Principal>,
        T: Into<SessionToken>,
    {
        let token = token.into();
        if token.is_empty() {
            return Err(AppError::validation("empty_token", "refusing to store a session without a token"));
        }
        let session = Arc::new(Session { token, principal: principal.into() });
        let user_id = session.principal.id;
        let encoded = self.storage.as_ref().map(|_| encode_session(Some(&session)));
        {
            let _order = self.write_order.lock();
            *self.current.write() = Some(session.clone());
            self.changes.send_replace(Some(session.clone()));
            if let Some(raw) = encoded {
                self.persist(raw);
            }
        }
        debug!(target: "session", "session set for user id={}", user_id);
        tprintln!("session.set_auth user={}", user_id);
        Ok(())
    }

    /// Clear the session locally. Never contacts the server; calling it on an
    /// already cleared store is a no-op apart from re-clearing storage.
    pub fn logout(&self) {
        let was = {
            let _order = self.write_order.lock();
            let was = self.current.write().take();
            self.changes.send_replace(None);
            if let Some(storage) = &self.storage {
                if let Err(e) = storage.clear() {
                    warn!(target: "session", "could not clear persisted session: {}", e);
                }
            }
            was
        };
        if let Some(s) = was {
            debug!(target: "session", "session cleared for user id={}", s.principal.id);
            tprintln!("session.logout user={}", s.principal.id);
        }
    }

    fn persist(&self, encoded: Result<String, StorageError>) {
        let Some(storage) = &self.storage else { return; };
        let res = encoded.and_then(|raw| storage.save(&raw));
        if let Err(e) = res {
            // The in-memory session stays authoritative; only reload survival is lost.
            warn!(target: "session", "could not persist session: {}", e);
        }
    }

    pub fn subscribe(&self) -> SessionWatcher {
        let rx = self.changes.subscribe();
        let seen = rx.borrow().clone();
        SessionWatcher { rx, seen }
    }
}

/// Change feed over the store. `changed_slice` only wakes when the selected
/// part of the session differs from what this watcher last saw, so a consumer
/// that only cares about the token is not woken by unrelated updates.
pub struct SessionWatcher {
    rx: watch::Receiver<SessionSnapshot>,
    seen: SessionSnapshot,
}

impl SessionWatcher {
    pub fn current(&self) -> SessionSnapshot { self.rx.borrow().clone() }

    /// Next snapshot, or None once the store is gone. Intermediate updates
    /// may be coalesced into the latest one.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.rx.changed().await.ok()?;
        let snap = self.rx.borrow_and_update().clone();
        self.seen = snap.clone();
        Some(snap)
    }

    pub async fn changed_slice<T, F>(&mut self, select: F) -> Option<T>
    where
        T: PartialEq,
        F: Fn(&SessionSnapshot) -> T,
    {
        let before = select(&self.seen);
        loop {
            let snap = self.changed().await?;
            let now = select(&snap);
            if now != before {
                return Some(now);
            }
        }
    }
}

/// Token slice selector.
pub fn token_slice(s: &SessionSnapshot) -> Option<SessionToken> {
    s.as_ref().map(|s| s.token.clone())
}

/// Principal slice selector.
pub fn principal_slice(s: &SessionSnapshot) -> Option<Principal> {
    s.as_ref().map(|s| s.principal.clone())
}
