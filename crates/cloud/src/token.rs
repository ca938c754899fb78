//! Access token cache with refresh and failure cooldown.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::{self, SignedHeaders};
use crate::client::parse_envelope;
use crate::error::CloudError;
use crate::types::TokenResponse;

/// Tokens are renewed this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 300;
const MAX_CONSECUTIVE_FAILURES: u32 = 5;
const FAILURE_COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct TokenState {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

impl TokenState {
    fn from_response(token: TokenResponse, now: i64) -> Self {
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: now + token.expire_time,
        }
    }

    fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at - EXPIRY_MARGIN_SECS
    }
}

/// Acquires and caches the project access token.
pub(crate) struct TokenManager {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
    state: RwLock<Option<TokenState>>,
    consecutive_failures: AtomicU32,
    last_failure: AtomicI64,
}

impl TokenManager {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        client_id: String,
        secret: String,
    ) -> Self {
        Self {
            http,
            base_url,
            client_id,
            secret,
            state: RwLock::new(None),
            consecutive_failures: AtomicU32::new(0),
            last_failure: AtomicI64::new(0),
        }
    }

    /// Returns a valid access token, refreshing or re-acquiring as needed.
    pub(crate) async fn access_token(&self) -> Result<String, CloudError> {
        let now = chrono::Utc::now().timestamp();
        if let Some(token) = self.state.read().await.as_ref()
            && !token.is_expired(now)
        {
            return Ok(token.access_token.clone());
        }

        self.check_cooldown(now)?;

        let mut state = self.state.write().await;

        // Another task may have renewed it while we waited for the lock.
        if let Some(token) = state.as_ref() {
            if !token.is_expired(now) {
                return Ok(token.access_token.clone());
            }
            let path = format!("/v1.0/token/{}", token.refresh_token);
            match self.request_token(&path, &[]).await {
                Ok(fresh) => return Ok(self.store(&mut state, fresh)),
                Err(e) => {
                    self.record_failure();
                    warn!(error = %e, "token refresh failed, acquiring a new token");
                }
            }
        }

        match self.request_token("/v1.0/token", &[("grant_type", "1")]).await {
            Ok(fresh) => Ok(self.store(&mut state, fresh)),
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    /// Drops the cached token so the next request acquires a new one.
    pub(crate) async fn invalidate(&self) {
        *self.state.write().await = None;
    }

    fn store(&self, state: &mut Option<TokenState>, fresh: TokenState) -> String {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let token = fresh.access_token.clone();
        *state = Some(fresh);
        token
    }

    fn check_cooldown(&self, now: i64) -> Result<(), CloudError> {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        if failures < MAX_CONSECUTIVE_FAILURES {
            return Ok(());
        }
        let remaining = FAILURE_COOLDOWN_SECS - (now - self.last_failure.load(Ordering::Relaxed));
        if remaining > 0 {
            warn!(failures, remaining, "token acquisition cooling down");
            return Err(CloudError::RateLimited(remaining));
        }
        self.consecutive_failures.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn record_failure(&self) {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        self.last_failure
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
    }

    async fn request_token(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<TokenState, CloudError> {
        let canonical = auth::string_to_sign("GET", path, query, None);
        let headers = SignedHeaders::for_token(
            &self.client_id,
            &self.secret,
            &canonical,
            auth::timestamp_ms(),
            &auth::nonce(),
        )?;

        let url = format!("{}{}", self.base_url, path);
        debug!(%path, "requesting access token");

        let resp = headers
            .apply(self.http.get(&url).query(query))
            .send()
            .await?;
        let body = resp.text().await?;
        let token: TokenResponse = parse_envelope(&body)?;
        Ok(TokenState::from_response(
            token,
            chrono::Utc::now().timestamp(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::mock_server;

    fn manager(url: String) -> TokenManager {
        TokenManager::new(reqwest::Client::new(), url, "cid".into(), "secret".into())
    }

    const TOKEN_OK: &str = r#"{"success":true,"t":1,"result":
        {"access_token":"tok-1","refresh_token":"ref-1","expire_time":7200,"uid":"u"}}"#;

    #[test]
    fn token_expiry_honours_margin() {
        let state = TokenState {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 1_000,
        };
        assert!(!state.is_expired(1_000 - EXPIRY_MARGIN_SECS - 1));
        assert!(state.is_expired(1_000 - EXPIRY_MARGIN_SECS));
    }

    #[tokio::test]
    async fn token_is_cached_after_first_acquisition() {
        let (url, requests, handle) = mock_server(vec![TOKEN_OK]).await;
        let mgr = manager(url);

        assert_eq!(mgr.access_token().await.unwrap(), "tok-1");
        // Served from cache; the mock only answers once.
        assert_eq!(mgr.access_token().await.unwrap(), "tok-1");

        let seen = requests.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("GET /v1.0/token?grant_type=1"));

        handle.abort();
    }

    #[tokio::test]
    async fn invalidate_forces_reacquisition() {
        let second = r#"{"success":true,"t":1,"result":
            {"access_token":"tok-2","refresh_token":"ref-2","expire_time":7200}}"#;
        let (url, _requests, handle) = mock_server(vec![TOKEN_OK, second]).await;
        let mgr = manager(url);

        assert_eq!(mgr.access_token().await.unwrap(), "tok-1");
        mgr.invalidate().await;
        assert_eq!(mgr.access_token().await.unwrap(), "tok-2");

        handle.abort();
    }

    #[tokio::test]
    async fn api_failure_is_reported() {
        let denied = r#"{"success":false,"code":1004,"msg":"sign invalid","t":1}"#;
        let (url, _requests, handle) = mock_server(vec![denied]).await;
        let mgr = manager(url);

        let err = mgr.access_token().await.unwrap_err();
        assert!(matches!(err, CloudError::Api { code: 1004, .. }));
        assert_eq!(mgr.consecutive_failures.load(Ordering::Relaxed), 1);

        handle.abort();
    }

    #[test]
    fn cooldown_after_repeated_failures() {
        let mgr = manager("http://127.0.0.1:9".into());
        for _ in 0..MAX_CONSECUTIVE_FAILURES {
            mgr.record_failure();
        }
        let now = chrono::Utc::now().timestamp();
        assert!(matches!(
            mgr.check_cooldown(now),
            Err(CloudError::RateLimited(_))
        ));
        // Once the cooldown has elapsed the counter resets.
        assert!(mgr.check_cooldown(now + FAILURE_COOLDOWN_SECS + 1).is_ok());
        assert_eq!(mgr.consecutive_failures.load(Ordering::Relaxed), 0);
    }
}
