//! Cart records: the lifecycle data model held by the registry.

use cartwatch_core::CartSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartRecord {
    /// Storefront cart token, unique among live records.
    pub token: String,
    /// Cart contents at track time.
    pub snapshot: CartSnapshot,
    pub state: CartState,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Lifecycle state. Removal is represented by absence from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "by", rename_all = "snake_case")]
pub enum CartState {
    Tracked,
    Resolved(Resolution),
}

/// What resolved the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The customer started checkout before the grace period ran out.
    CheckoutStarted,
    /// The grace period ran out and the cart was handed to the lead sink.
    Abandoned,
}

/// Result of `CartRegistry::track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Started,
    AlreadyTracked,
}

/// Result of `CartRegistry::mark_resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved,
    /// Record exists but was resolved earlier. No state change.
    AlreadyResolved,
    NotFound,
}

impl CartRecord {
    pub fn new(token: &str, snapshot: CartSnapshot) -> Self {
        Self {
            token: token.to_string(),
            snapshot,
            state: CartState::Tracked,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_tracked(&self) -> bool {
        self.state == CartState::Tracked
    }

    /// Time since tracking started. Diagnostics only.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Move `Tracked → Resolved`. Returns false if already resolved.
    pub(crate) fn resolve(&mut self, by: Resolution) -> bool {
        if !self.is_tracked() {
            return false;
        }
        self.state = CartState::Resolved(by);
        self.resolved_at = Some(Utc::now());
        true
    }
}
