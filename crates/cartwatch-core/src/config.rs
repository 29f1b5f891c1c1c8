//! Cartwatch configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CartwatchError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartwatchConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub crm: CrmConfig,
}

impl CartwatchConfig {
    /// Load config from the default path (~/.cartwatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cartwatch")
            .join("config.toml")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored so an unset-but-exported variable
    /// does not wipe a configured secret.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PORT") {
            self.gateway.port = parse_number("PORT", &v)?;
        }
        if let Some(v) = get("CARTWATCH_ALLOWED_ORIGINS") {
            self.gateway.allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = get("CARTWATCH_GRACE_PERIOD_SECS") {
            self.tracking.grace_period_secs = parse_number("CARTWATCH_GRACE_PERIOD_SECS", &v)?;
        }
        if let Some(v) = get("CARTWATCH_RETENTION_SECS") {
            self.tracking.retention_secs = parse_number("CARTWATCH_RETENTION_SECS", &v)?;
        }

        let crm = &mut self.crm;
        for (key, slot) in [
            ("ZOHO_LEADS_URL", &mut crm.leads_url),
            ("ZOHO_TOKEN_URL", &mut crm.token_url),
            ("ZOHO_CLIENT_ID", &mut crm.client_id),
            ("ZOHO_CLIENT_SECRET", &mut crm.client_secret),
            ("ZOHO_ACCESS_TOKEN", &mut crm.access_token),
            ("ZOHO_REFRESH_TOKEN", &mut crm.refresh_token),
        ] {
            if let Some(v) = get(key) {
                *slot = v;
            }
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tracking.grace_period_secs == 0 {
            return Err(CartwatchError::Config(
                "tracking.grace_period_secs must be greater than zero".into(),
            ));
        }
        if self.crm.leads_url.is_empty() || self.crm.token_url.is_empty() {
            return Err(CartwatchError::Config(
                "crm.leads_url and crm.token_url are required".into(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CartwatchError::Config(format!("{key} must be a number, got '{value}'")))
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API from a browser. Empty = any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

/// Abandonment timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Delay between tracking a cart and deciding it was abandoned.
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
    /// Delay between resolving a cart and dropping it from memory.
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

fn default_grace_period() -> u64 { 3600 }
fn default_retention() -> u64 { 300 }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period(),
            retention_secs: default_retention(),
        }
    }
}

impl TrackingConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Zoho CRM connection and OAuth credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default = "default_leads_url")]
    pub leads_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Initial access token; replaced in memory on every refresh.
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// Authorization header scheme, e.g. "Zoho-oauthtoken" or "Bearer".
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Zoho layout to file leads under.
    #[serde(default)]
    pub layout_id: Option<String>,
    #[serde(default)]
    pub lead: LeadDefaults,
}

fn default_leads_url() -> String { "https://www.zohoapis.com/crm/v7/Leads".into() }
fn default_token_url() -> String { "https://accounts.zoho.com/oauth/v2/token".into() }
fn default_auth_scheme() -> String { "Zoho-oauthtoken".into() }
fn default_timeout() -> u64 { 15 }

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            leads_url: default_leads_url(),
            token_url: default_token_url(),
            client_id: String::new(),
            client_secret: String::new(),
            access_token: String::new(),
            refresh_token: String::new(),
            auth_scheme: default_auth_scheme(),
            timeout_secs: default_timeout(),
            layout_id: None,
            lead: LeadDefaults::default(),
        }
    }
}

impl CrmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Placeholder values for lead fields the cart does not provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDefaults {
    #[serde(default = "default_first_name")]
    pub first_name: String,
    #[serde(default = "default_last_name")]
    pub last_name: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "not_available")]
    pub phone: String,
    #[serde(default = "not_available")]
    pub street: String,
    #[serde(default = "not_available")]
    pub city: String,
    #[serde(default = "not_available")]
    pub state: String,
    #[serde(default = "not_available")]
    pub country: String,
    #[serde(default = "default_zip")]
    pub zip_code: String,
    #[serde(default = "default_lead_source")]
    pub lead_source: String,
    #[serde(default = "default_lead_status")]
    pub lead_status: String,
}

fn default_first_name() -> String { "Shopify".into() }
fn default_last_name() -> String { "Customer".into() }
fn default_email() -> String { "unknown@example.com".into() }
fn not_available() -> String { "N/A".into() }
fn default_zip() -> String { "000000".into() }
fn default_lead_source() -> String { "Shopify Abandoned Cart".into() }
fn default_lead_status() -> String { "New Lead".into() }

impl Default for LeadDefaults {
    fn default() -> Self {
        Self {
            first_name: default_first_name(),
            last_name: default_last_name(),
            email: default_email(),
            phone: not_available(),
            street: not_available(),
            city: not_available(),
            state: not_available(),
            country: not_available(),
            zip_code: default_zip(),
            lead_source: default_lead_source(),
            lead_status: default_lead_status(),
        }
    }
}
