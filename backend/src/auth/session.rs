//! Server-side session registry.
//!
//! Sessions live in process memory, keyed by an opaque random token that the
//! browser holds in a signed cookie. Expired entries are dropped when they
//! are looked up, and every new login sweeps the ones nobody came back for.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::RngCore;

use super::models::SessionUser;

pub const SESSION_COOKIE: &str = "reparo_session";

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
struct SessionEntry {
    user: SessionUser,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    entries: Arc<DashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Registers a new session and returns its token.
    pub fn issue(&self, user: SessionUser) -> String {
        self.purge_expired();
        let mut raw = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        self.entries.insert(
            token.clone(),
            SessionEntry {
                user,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    pub fn get(&self, token: &str) -> Option<SessionUser> {
        let live = self
            .entries
            .get(token)
            .map(|entry| (entry.expires_at > Instant::now()).then(|| entry.user.clone()))?;
        if live.is_none() {
            self.entries.remove(token);
        }
        live
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions removed");
        }
        purged
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.entries.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
