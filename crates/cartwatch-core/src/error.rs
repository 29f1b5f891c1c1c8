//! Error type shared across the Cartwatch crates.

/// Result alias used by every library crate.
pub type Result<T> = std::result::Result<T, CartwatchError>;

#[derive(Debug, thiserror::Error)]
pub enum CartwatchError {
    /// Inbound request rejected before any state change.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    /// Transport-level failure (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The CRM rejected the access token (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The CRM answered with a non-success, non-401 status.
    #[error("CRM API error {status}: {body}")]
    Crm { status: u16, body: String },

    #[error("Token refresh failed: {0}")]
    Refresh(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CartwatchError {
    /// Whether this failure should trigger a credential refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}
