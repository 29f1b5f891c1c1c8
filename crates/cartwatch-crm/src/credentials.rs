//! OAuth credential state and the refresh-token grant.
//!
//! The access token lives only in memory: seeded from config at startup,
//! replaced in place by each successful refresh, never written back.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cartwatch_core::config::CrmConfig;
use cartwatch_core::{CartwatchError, Result};
use serde::Deserialize;

/// Token endpoint response. Zoho answers some failures with 200 and an
/// `error` field instead of a token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Process-wide CRM credentials.
pub struct Credentials {
    access_token: RwLock<String>,
    refresh_token: String,
    client_id: String,
    client_secret: String,
    token_url: String,
    /// Serializes refreshes so concurrent 401s share one token request.
    refresh_gate: tokio::sync::Mutex<()>,
    refresh_count: AtomicU64,
}

impl Credentials {
    pub fn from_config(config: &CrmConfig) -> Self {
        Self {
            access_token: RwLock::new(config.access_token.clone()),
            refresh_token: config.refresh_token.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            refresh_gate: tokio::sync::Mutex::new(()),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Current access token.
    pub fn access_token(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of successful token requests since startup.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Obtain a new access token to replace `rejected`.
    ///
    /// If another caller already replaced `rejected` while this one waited
    /// on the gate, the newer token is returned without a second request.
    /// On failure the stored token is left untouched.
    pub async fn refresh(
        &self,
        client: &reqwest::Client,
        rejected: &str,
        timeout: Duration,
    ) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        let current = self.access_token();
        if !current.is_empty() && current != rejected {
            tracing::debug!("Access token already refreshed by a concurrent request");
            return Ok(current);
        }

        tracing::info!("🔄 Refreshing Zoho access token...");
        let params = [
            ("refresh_token", self.refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let resp = client
            .post(&self.token_url)
            .form(&params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("❌ Token refresh failed: {e}");
                CartwatchError::Refresh(format!("token endpoint unreachable: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!("❌ Token refresh failed: {} {}", status, body);
            return Err(CartwatchError::Refresh(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let body: TokenResponse = resp.json().await.map_err(|e| {
            CartwatchError::Refresh(format!("malformed token response: {e}"))
        })?;

        let Some(token) = body.access_token.filter(|t| !t.trim().is_empty()) else {
            let reason = body.error.unwrap_or_else(|| "no error given".into());
            tracing::error!("❌ Token response missing access_token ({})", reason);
            return Err(CartwatchError::Refresh(format!(
                "response missing access_token ({reason})"
            )));
        };

        *self.access_token.write().unwrap_or_else(|e| e.into_inner()) = token.clone();
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        tracing::info!("✅ Token refreshed successfully: {}...", token_prefix(&token));
        Ok(token)
    }
}

/// First few characters of a token, safe to log.
pub(crate) fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    &token[..end]
}
