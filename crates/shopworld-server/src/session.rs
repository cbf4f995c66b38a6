//! Server-side sessions keyed by an opaque cookie value.
//!
//! A session maps a random 256-bit id to a user id and an expiry. Nothing
//! but the id ever reaches the client.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};
use dashmap::DashMap;
use rand::Rng;
use shopworld_core::UserId;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: UserId,
    expires_at: OffsetDateTime,
}

impl Session {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    config: SessionConfig,
}

fn generate_session_id() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn ttl(&self) -> time::Duration {
        time::Duration::seconds(i64::try_from(self.config.max_age_secs).unwrap_or(i64::MAX))
    }

    /// Starts a session for `user_id` and returns its id.
    pub fn create(&self, user_id: UserId) -> String {
        let id = generate_session_id();
        let expires_at = OffsetDateTime::now_utc().saturating_add(self.ttl());
        self.sessions.insert(
            id.clone(),
            Session {
                user_id,
                expires_at,
            },
        );
        tracing::debug!(user_id, "Session created");
        id
    }

    /// The user behind a live session. Expired sessions are dropped here.
    pub fn user_id(&self, session_id: &str) -> Option<UserId> {
        let now = OffsetDateTime::now_utc();
        let session = *self.sessions.get(session_id)?;
        if session.is_expired(now) {
            self.sessions.remove(session_id);
            return None;
        }
        Some(session.user_id)
    }

    pub fn destroy(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Removes expired sessions and returns how many were dropped.
    pub fn prune(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Runs [`prune`](Self::prune) every `prune_interval_secs` until aborted.
    pub fn spawn_pruner(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.prune_interval_secs.max(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = self.prune();
                if removed > 0 {
                    tracing::debug!(removed, "Pruned expired sessions");
                }
            }
        })
    }

    /// `Set-Cookie` value carrying the session id.
    pub fn build_cookie(&self, session_id: &str) -> Option<HeaderValue> {
        let secure = if self.config.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite={}{}",
            self.config.cookie_name,
            session_id,
            self.config.max_age_secs,
            self.config.same_site.as_str(),
            secure
        );
        HeaderValue::from_str(&cookie).ok()
    }

    /// `Set-Cookie` value that makes the client forget the session.
    pub fn clear_cookie(&self) -> Option<HeaderValue> {
        let secure = if self.config.secure { "; Secure" } else { "" };
        let cookie = format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite={}{}",
            self.config.cookie_name,
            self.config.same_site.as_str(),
            secure
        );
        HeaderValue::from_str(&cookie).ok()
    }

    /// Reads the session id from the `Cookie` headers.
    pub fn session_id_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let cookie_name = &self.config.cookie_name;
        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for cookie in header.split(';') {
                if let Some((name, value)) = cookie.trim().split_once('=')
                    && name.trim() == cookie_name
                {
                    let value = value.trim();
                    if !value.is_empty() {
                        return Some(value.to_string());
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSite;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default())
    }

    #[test]
    fn session_ids_are_random_hex() {
        let store = store();
        let a = store.create(1);
        let b = store.create(1);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(store.user_id(&a), Some(1));
    }

    #[test]
    fn destroyed_and_unknown_sessions_are_absent() {
        let store = store();
        let id = store.create(7);
        store.destroy(&id);
        assert_eq!(store.user_id(&id), None);
        assert_eq!(store.user_id("nope"), None);
    }

    #[test]
    fn expired_sessions_are_absent_and_pruned() {
        let store = store();
        let live = store.create(1);
        store.sessions.insert(
            "stale".into(),
            Session {
                user_id: 2,
                expires_at: OffsetDateTime::now_utc() - time::Duration::seconds(1),
            },
        );
        assert_eq!(store.prune(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.user_id(&live), Some(1));

        store.sessions.insert(
            "stale".into(),
            Session {
                user_id: 2,
                expires_at: OffsetDateTime::now_utc() - time::Duration::seconds(1),
            },
        );
        assert_eq!(store.user_id("stale"), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn pruner_survives_zero_interval() {
        let store = Arc::new(SessionStore::new(SessionConfig {
            prune_interval_secs: 0,
            ..SessionConfig::default()
        }));
        let handle = store.clone().spawn_pruner();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[test]
    fn cookie_attributes_follow_config() {
        let store = SessionStore::new(SessionConfig {
            secure: true,
            same_site: SameSite::Strict,
            ..SessionConfig::default()
        });
        let cookie = store.build_cookie("abc").unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("shopworld.sid=abc"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));

        let cleared = store.clear_cookie().unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn reads_session_id_among_other_cookies() {
        let store = store();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; shopworld.sid=deadbeef; lang=en"),
        );
        assert_eq!(
            store.session_id_from_headers(&headers).as_deref(),
            Some("deadbeef")
        );

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("shopworld.sid="));
        assert_eq!(store.session_id_from_headers(&headers), None);
    }
}
