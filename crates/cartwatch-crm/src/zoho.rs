//! Zoho CRM lead delivery.

use std::time::Duration;

use async_trait::async_trait;
use cartwatch_core::config::CrmConfig;
use cartwatch_core::{CartSnapshot, CartwatchError, LeadSink, Result};
use reqwest::StatusCode;
use serde_json::Value;

use crate::credentials::{Credentials, token_prefix};
use crate::lead::build_lead;

/// Lead sink that POSTs to the Zoho Leads API.
pub struct ZohoClient {
    config: CrmConfig,
    credentials: Credentials,
    timeout: Duration,
    client: reqwest::Client,
}

impl ZohoClient {
    pub fn from_config(config: &CrmConfig) -> Self {
        Self {
            config: config.clone(),
            credentials: Credentials::from_config(config),
            timeout: config.timeout(),
            client: reqwest::Client::new(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Send a lead body, refreshing the token once on 401.
    ///
    /// Exactly one refresh and one retry; a second 401 is a failure.
    pub async fn send_lead(&self, body: &Value) -> Result<()> {
        let token = self.credentials.access_token();
        match self.post_lead(body, &token).await {
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("⚠️ Access token expired. Refreshing...");
                let fresh = self
                    .credentials
                    .refresh(&self.client, &token, self.timeout)
                    .await?;
                self.post_lead(body, &fresh).await.inspect(|_| {
                    tracing::info!("✅ Retried Zoho API successfully");
                })
            }
            other => other,
        }
    }

    /// One POST to the Leads endpoint.
    async fn post_lead(&self, body: &Value, token: &str) -> Result<()> {
        tracing::debug!(
            "📡 Sending lead to Zoho (token {}...)",
            token_prefix(token)
        );
        let resp = self
            .client
            .post(&self.config.leads_url)
            .header("Authorization", format!("{} {}", self.config.auth_scheme, token))
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                CartwatchError::Http(format!(
                    "Zoho connection failed ({}): {}",
                    self.config.leads_url, e
                ))
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if status.is_success() {
            tracing::debug!("Zoho response {}: {}", status, text);
            return Ok(());
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(CartwatchError::Unauthorized(text));
        }
        Err(CartwatchError::Crm {
            status: status.as_u16(),
            body: text,
        })
    }
}

#[async_trait]
impl LeadSink for ZohoClient {
    fn name(&self) -> &str {
        "zoho"
    }

    async fn deliver(&self, cart_token: &str, snapshot: &CartSnapshot) -> Result<()> {
        let body = build_lead(snapshot, &self.config);
        tracing::debug!("Lead payload for cart {}: {}", cart_token, body);
        self.send_lead(&body).await
    }
}
