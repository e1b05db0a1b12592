use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::storage::{DurableStorage, Revision, StorageMap};

/// Storage key for the JSON-serialized user profile
pub const USER_KEY: &str = "user";

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "accessToken";

/// Older builds stored the token under this key.
pub const LEGACY_TOKEN_KEY: &str = "auth_token";

/// The authenticated identity: profile and token always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Value,
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub user: Option<Value>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

impl SessionStatus {
    fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) => Self {
                user: Some(s.user.clone()),
                token: Some(s.token.clone()),
                is_authenticated: true,
            },
            None => Self::default(),
        }
    }
}

/// Where a session read from storage found its token.
#[derive(Debug, PartialEq, Eq)]
enum TokenSource {
    Canonical,
    Legacy,
}

/// Parse a stored session. Anything malformed counts as no session.
fn parse_session(entries: &StorageMap) -> Option<(Session, TokenSource)> {
    let (token, source) = match entries.get(TOKEN_KEY).filter(|t| !t.is_empty()) {
        Some(t) => (t.clone(), TokenSource::Canonical),
        None => (
            entries.get(LEGACY_TOKEN_KEY).filter(|t| !t.is_empty())?.clone(),
            TokenSource::Legacy,
        ),
    };

    let raw_user = entries.get(USER_KEY)?;
    let user: Value = match serde_json::from_str(raw_user) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Stored user profile is not valid JSON, ignoring session");
            return None;
        }
    };
    if user.is_null() {
        return None;
    }

    Some((Session { user, token }, source))
}

/// Single source of truth for the current session, persisted to durable
/// storage. Memory and storage agree after every completed call.
pub struct SessionStore {
    storage: Box<dyn DurableStorage>,
    current: Option<Session>,
    tx: watch::Sender<SessionStatus>,
}

impl SessionStore {
    pub fn new(storage: Box<dyn DurableStorage>) -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::default());
        Self {
            storage,
            current: None,
            tx,
        }
    }

    fn load_entries(&self) -> StorageMap {
        match self.storage.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to read session storage, treating as empty");
                StorageMap::new()
            }
        }
    }

    fn publish(&self) {
        let status = SessionStatus::from_session(self.current.as_ref());
        self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }

    /// Load any persisted session. Never fails: unreadable or malformed data
    /// leaves the store empty.
    pub fn initialize(&mut self) -> SessionStatus {
        let mut entries = self.load_entries();

        self.current = match parse_session(&entries) {
            Some((session, TokenSource::Legacy)) => {
                info!("Migrating session token from legacy storage key");
                entries.remove(LEGACY_TOKEN_KEY);
                entries.insert(TOKEN_KEY.to_string(), session.token.clone());
                if let Err(e) = self.storage.store(&entries) {
                    warn!(error = %e, "Failed to migrate legacy session token");
                }
                Some(session)
            }
            Some((session, TokenSource::Canonical)) => Some(session),
            None => None,
        };

        debug!(authenticated = self.current.is_some(), "Session store initialized");
        self.publish();
        self.status()
    }

    /// Store a new session. Storage is written first; memory only changes
    /// once the write has succeeded.
    pub fn set_session(&mut self, user: Value, token: impl Into<String>) -> Result<SessionStatus> {
        let token = token.into();
        if token.is_empty() {
            bail!("Refusing to store an empty token");
        }
        if user.is_null() {
            bail!("Refusing to store an empty user profile");
        }

        let mut entries = self.load_entries();
        entries.insert(USER_KEY.to_string(), serde_json::to_string(&user)?);
        entries.insert(TOKEN_KEY.to_string(), token.clone());
        entries.remove(LEGACY_TOKEN_KEY);
        self.storage.store(&entries)?;

        self.current = Some(Session { user, token });
        self.publish();
        Ok(self.status())
    }

    /// Remove the session. Idempotent. Memory is cleared even when storage
    /// cannot be read or written, so the caller never keeps a session it
    /// asked to drop; the error is still returned.
    pub fn clear_session(&mut self) -> Result<()> {
        self.current = None;
        self.publish();

        let mut entries = self.storage.load()?;
        let mut removed = false;
        for key in [USER_KEY, TOKEN_KEY, LEGACY_TOKEN_KEY] {
            removed |= entries.remove(key).is_some();
        }
        if removed {
            self.storage.store(&entries)?;
        }
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_session(self.current.as_ref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn user(&self) -> Option<&Value> {
        self.current.as_ref().map(|s| &s.user)
    }

    /// Receive every status change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    /// Change marker of the backing storage, if it has one.
    pub fn storage_revision(&self) -> Option<Revision> {
        self.storage.revision()
    }

    /// Pick up changes another process made to storage. Returns true when
    /// the in-memory session changed.
    pub fn sync_from_storage(&mut self) -> bool {
        let stored = parse_session(&self.load_entries()).map(|(session, _)| session);
        if stored == self.current {
            return false;
        }
        info!(
            authenticated = stored.is_some(),
            "Session changed in storage, updating"
        );
        self.current = stored;
        self.publish();
        true
    }
}

/// Poll storage on a fixed interval and apply external changes. The file is
/// re-read only when its revision moves (or when the storage has none).
/// Delivery is best-effort and lags by up to one interval.
pub fn spawn_storage_watcher(store: Arc<Mutex<SessionStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_seen: Option<Revision> = None;
        loop {
            ticker.tick().await;
            let mut store = store.lock().await;
            let revision = store.storage_revision();
            if revision.is_some() && revision == last_seen {
                continue;
            }
            store.sync_from_storage();
            last_seen = revision;
        }
    })
}
