//! Admin sessions.
//!
//! A session is an opaque random token stored in memory with an expiry. The
//! token travels in the `admin_token` cookie.

use axum::http::{header, HeaderMap};
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "admin_token";

/// In-memory store of live admin sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Instant>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a session valid for `ttl`, dropping any expired ones first.
    pub fn create(&self, ttl: Duration) -> Uuid {
        self.purge_expired();
        let token = Uuid::new_v4();
        self.sessions.insert(token, Instant::now() + ttl);
        token
    }

    /// True when `token` names an unexpired session. Expired sessions are dropped.
    pub fn is_valid(&self, token: &str) -> bool {
        let Ok(token) = Uuid::parse_str(token) else {
            return false;
        };
        let now = Instant::now();
        let expired = match self.sessions.get(&token) {
            Some(expires_at) => now >= *expires_at,
            None => return false,
        };
        if expired {
            self.sessions.remove(&token);
        }
        !expired
    }

    pub fn revoke(&self, token: &str) {
        if let Ok(token) = Uuid::parse_str(token) {
            self.sessions.remove(&token);
        }
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, expires_at| now < *expires_at);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Extract the session token from the request's cookies.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: Uuid, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={}",
        ttl.as_secs()
    )
}

/// `Set-Cookie` value removing the session cookie.
pub fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tokio::time::advance;

    const TTL: Duration = Duration::from_secs(8 * 60 * 60);

    #[tokio::test(start_paused = true)]
    async fn session_expires_after_ttl() {
        let store = SessionStore::new();
        let token = store.create(TTL).to_string();
        assert!(store.is_valid(&token));

        advance(TTL - Duration::from_secs(1)).await;
        assert!(store.is_valid(&token));

        advance(Duration::from_secs(1)).await;
        assert!(!store.is_valid(&token));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn revoke_and_purge() {
        let store = SessionStore::new();
        let a = store.create(TTL).to_string();
        store.create(Duration::from_secs(1));
        assert_eq!(store.len(), 2);

        store.revoke(&a);
        assert!(!store.is_valid(&a));

        advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 1);
        assert!(store.is_empty());

        store.create(Duration::from_secs(1));
        advance(Duration::from_secs(2)).await;
        store.create(TTL);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn garbage_tokens_are_rejected() {
        let store = SessionStore::new();
        assert!(!store.is_valid("not-a-uuid"));
        assert!(!store.is_valid(&Uuid::new_v4().to_string()));
    }

    #[test]
    fn finds_token_among_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; admin_token=abc=def; b=2"),
        );
        assert_eq!(session_token(&headers), Some("abc=def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_token="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let token = Uuid::nil();
        assert_eq!(
            session_cookie(token, TTL),
            "admin_token=00000000-0000-0000-0000-000000000000; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=28800"
        );
        assert!(clear_cookie().ends_with("Max-Age=0"));
    }
}
