use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin-session";

/// Lifetime of an admin session, also used as the cookie max age.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Maps opaque session tokens to their expiry.
///
/// The admin gate only needs issue/check/revoke; credentials are checked by
/// the caller before `issue` is reached.
pub trait SessionStore: Send + Sync {
    fn issue(&self, now: DateTime<Utc>) -> Session;

    fn is_active(&self, token: &str, now: DateTime<Utc>) -> bool;

    fn revoke(&self, token: &str);
}

/// Process-local sessions. A restart signs every operator out.
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        // The map holds no invariants a panicking writer could break.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore for InMemorySessionStore {
    fn issue(&self, now: DateTime<Utc>) -> Session {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = now + self.ttl;

        let mut sessions = self.sessions();
        sessions.retain(|_, expiry| *expiry > now);
        sessions.insert(token.clone(), expires_at);

        Session { token, expires_at }
    }

    fn is_active(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.sessions()
            .get(token)
            .is_some_and(|expiry| *expiry > now)
    }

    fn revoke(&self, token: &str) {
        self.sessions().remove(token);
    }
}
