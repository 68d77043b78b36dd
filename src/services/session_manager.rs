// src/services/session_manager.rs
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: String,
    pub session_id: String,
    pub last_active: Instant,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: Uuid::new_v4().to_string(),
            last_active: Instant::now(),
        }
    }
}

/// NLU session ids keyed by platform user id.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Option<Duration>,
}

impl Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionManager {
    // `None` keeps sessions for the lifetime of the process.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Session id for this user, creating one on first contact.
    pub async fn session_for(&self, user_id: &str) -> String {
        let mut guard = self.inner.write().await;
        let session = guard
            .entry(user_id.to_string())
            .or_insert_with(|| Session::new(user_id));
        session.last_active = Instant::now();
        session.session_id.clone()
    }

    /// Remove sessions idle longer than ttl. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let mut guard = self.inner.write().await;
        let now = Instant::now();
        let before = guard.len();
        guard.retain(|_, s| now.duration_since(s.last_active) < ttl);
        before - guard.len()
    }

    /// Number of users with a session
    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.len()
    }
}
