//! Cart tracker: arms one-shot timers and acts on them when they fire.
//!
//! Each tracked cart gets one abandonment timer (grace period). When it
//! fires, the cart is claimed from the registry and handed to the lead
//! sink at most once. Resolved carts get one cleanup timer (retention).
//! Timers are never cancelled; a timer whose precondition no longer holds
//! does nothing.

use std::sync::Arc;
use std::time::Duration;

use cartwatch_core::config::TrackingConfig;
use cartwatch_core::{CartSnapshot, CartwatchError, LeadSink, Result};
use tokio::task::JoinHandle;

use crate::events::{DeliveryEvent, DeliveryOutcome, EventLog};
use crate::records::{ResolveOutcome, TrackOutcome};
use crate::store::CartRegistry;

/// Timer delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Track-time to abandonment evaluation.
    pub grace_period: Duration,
    /// Resolution to removal from the registry.
    pub retention: Duration,
}

impl From<&TrackingConfig> for Timings {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            retention: config.retention(),
        }
    }
}

/// Entry point for inbound cart events. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CartTracker {
    registry: Arc<CartRegistry>,
    sink: Arc<dyn LeadSink>,
    events: Arc<EventLog>,
    timings: Timings,
}

impl CartTracker {
    pub fn new(sink: Arc<dyn LeadSink>, timings: Timings) -> Self {
        Self {
            registry: Arc::new(CartRegistry::new()),
            sink,
            events: Arc::new(EventLog::new()),
            timings,
        }
    }

    pub fn registry(&self) -> &CartRegistry {
        &self.registry
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    /// Start tracking a cart and arm its abandonment timer.
    ///
    /// Re-delivery of the same token is a no-op that reports `AlreadyTracked`.
    pub fn track(&self, token: &str, snapshot: CartSnapshot) -> Result<TrackOutcome> {
        let token = validate_token(token)?;

        let outcome = self.registry.track(token, snapshot);
        match outcome {
            TrackOutcome::Started => {
                tracing::info!(
                    "🛍️ Tracking new cart: {} (check in {}s)",
                    token,
                    self.timings.grace_period.as_secs()
                );
                self.schedule_check(token, self.timings.grace_period);
            }
            TrackOutcome::AlreadyTracked => {
                tracing::debug!("Cart {} already being tracked", token);
            }
        }
        Ok(outcome)
    }

    /// Record that checkout started, so the cart is never treated as abandoned.
    pub fn checkout_started(&self, token: &str) -> Result<ResolveOutcome> {
        let token = validate_token(token)?;

        let outcome = self.registry.mark_resolved(token);
        match outcome {
            ResolveOutcome::Resolved => {
                tracing::info!("✅ Checkout started for cart: {}", token);
                self.schedule_cleanup(token, self.timings.retention);
            }
            ResolveOutcome::AlreadyResolved => {
                tracing::debug!("Cart {} already resolved, ignoring checkout signal", token);
            }
            ResolveOutcome::NotFound => {
                tracing::warn!("⚠️ Checkout started for unknown cart: {}", token);
            }
        }
        Ok(outcome)
    }

    /// Arm a one-shot abandonment check.
    pub fn schedule_check(&self, token: &str, delay: Duration) -> JoinHandle<()> {
        let this = self.clone();
        let token = token.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.evaluate(&token).await;
        })
    }

    /// Arm a one-shot removal of the record currently held for `token`.
    ///
    /// The timer is bound to that record: if it was removed and the token
    /// tracked again in the meantime, the newer record is left alone.
    pub fn schedule_cleanup(&self, token: &str, delay: Duration) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let token = token.to_string();
        let armed_for = registry.peek(&token).map(|r| r.created_at);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(created_at) = armed_for else {
                return;
            };
            if registry.remove_created_at(&token, created_at) {
                tracing::info!("🗑️ Cleaned up cart: {}", token);
            }
        })
    }

    /// Decide whether `token` was abandoned and deliver it if so.
    ///
    /// Returns `None` when there was nothing to do: the cart is gone, was
    /// resolved by checkout, or another evaluation claimed it first.
    pub async fn evaluate(&self, token: &str) -> Option<DeliveryOutcome> {
        let Some(record) = self.registry.peek(token) else {
            tracing::debug!("Cart {} cleared before evaluation", token);
            return None;
        };
        if !record.is_tracked() {
            tracing::info!("✅ Cart {} checked out, skipping", token);
            return None;
        }

        // Tracked → Resolved happens here, before any await. The record is
        // Resolved from now on, so its cleanup timer starts now too.
        let snapshot = self.registry.claim(token)?;
        self.schedule_cleanup(token, self.timings.retention);

        tracing::info!(
            "🚨 Abandoned cart detected: {} (idle {}s, total {})",
            token,
            record.age().num_seconds(),
            snapshot.total_display()
        );

        let outcome = match self.sink.deliver(token, &snapshot).await {
            Ok(()) => {
                tracing::info!("✅ Sent abandoned cart {} to {}", token, self.sink.name());
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(
                    "❌ Failed to send cart {} to {}: {}",
                    token,
                    self.sink.name(),
                    e
                );
                DeliveryOutcome::Failed(e.to_string())
            }
        };

        self.events.record(DeliveryEvent {
            cart_token: token.to_string(),
            sink: self.sink.name().to_string(),
            outcome: outcome.clone(),
            total: snapshot.total_display(),
            timestamp: chrono::Utc::now(),
        });

        if !outcome.is_delivered() {
            self.registry.remove_created_at(token, record.created_at);
        }

        Some(outcome)
    }
}

/// Tokens are opaque: blank ones are rejected, anything else is used as given.
fn validate_token(token: &str) -> Result<&str> {
    if token.trim().is_empty() {
        return Err(CartwatchError::Validation("cart token is missing".into()));
    }
    Ok(token)
}
