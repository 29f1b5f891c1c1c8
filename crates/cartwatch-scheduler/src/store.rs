//! Cart registry: in-memory keyed store of cart records.
//!
//! Every operation runs inside one short critical section and never awaits,
//! so state checks and transitions are atomic per call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cartwatch_core::CartSnapshot;
use chrono::{DateTime, Utc};

use crate::records::{CartRecord, Resolution, ResolveOutcome, TrackOutcome};

/// The single owner of cart records and their state.
#[derive(Default)]
pub struct CartRegistry {
    records: Mutex<HashMap<String, CartRecord>>,
}

impl CartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CartRecord>> {
        // A panic mid-operation cannot leave a record half-written.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new `Tracked` record. Idempotent per token.
    pub fn track(&self, token: &str, snapshot: CartSnapshot) -> TrackOutcome {
        let mut records = self.lock();
        if records.contains_key(token) {
            return TrackOutcome::AlreadyTracked;
        }
        records.insert(token.to_string(), CartRecord::new(token, snapshot));
        TrackOutcome::Started
    }

    /// Resolve a `Tracked` record because checkout started.
    pub fn mark_resolved(&self, token: &str) -> ResolveOutcome {
        self.resolve(token, Resolution::CheckoutStarted)
    }

    /// Atomically resolve a `Tracked` record for delivery.
    ///
    /// Returns the snapshot to deliver, or `None` if the cart is gone or was
    /// resolved first. Only the caller that gets `Some` may deliver.
    pub fn claim(&self, token: &str) -> Option<CartSnapshot> {
        let mut records = self.lock();
        let record = records.get_mut(token)?;
        record
            .resolve(Resolution::Abandoned)
            .then(|| record.snapshot.clone())
    }

    fn resolve(&self, token: &str, by: Resolution) -> ResolveOutcome {
        let mut records = self.lock();
        let Some(record) = records.get_mut(token) else {
            return ResolveOutcome::NotFound;
        };
        if record.resolve(by) {
            ResolveOutcome::Resolved
        } else {
            ResolveOutcome::AlreadyResolved
        }
    }

    /// Copy of the current record.
    pub fn peek(&self, token: &str) -> Option<CartRecord> {
        self.lock().get(token).cloned()
    }

    /// Unconditional delete. Returns whether a record was present.
    pub fn remove(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Delete the record for `token` only if it is the one created at
    /// `created_at`. A cart tracked again under the same token is kept.
    pub fn remove_created_at(&self, token: &str, created_at: DateTime<Utc>) -> bool {
        let mut records = self.lock();
        match records.get(token) {
            Some(record) if record.created_at == created_at => {
                records.remove(token);
                true
            }
            _ => false,
        }
    }

    /// Copies of all live records, oldest first.
    pub fn list(&self) -> Vec<CartRecord> {
        let mut all: Vec<CartRecord> = self.lock().values().cloned().collect();
        all.sort_by_key(|r| r.created_at);
        all
    }

    /// (tracked, resolved) counts.
    pub fn counts(&self) -> (usize, usize) {
        let records = self.lock();
        let tracked = records.values().filter(|r| r.is_tracked()).count();
        (tracked, records.len() - tracked)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CartState;

    fn snapshot(total: u64) -> CartSnapshot {
        serde_json::from_value(serde_json::json!({
            "total_price": total,
            "items": [{ "title": "Shirt", "quantity": 2 }]
        }))
        .unwrap()
    }

    #[test]
    fn test_track_is_idempotent() {
        let registry = CartRegistry::new();
        assert_eq!(registry.track("A", snapshot(5000)), TrackOutcome::Started);
        assert_eq!(registry.track("A", snapshot(9999)), TrackOutcome::AlreadyTracked);
        assert_eq!(registry.len(), 1);
        // First snapshot wins.
        assert_eq!(registry.peek("A").unwrap().snapshot.total_minor(), 5000);
    }

    #[test]
    fn test_mark_resolved_transitions_once() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(5000));

        assert_eq!(registry.mark_resolved("A"), ResolveOutcome::Resolved);
        assert_eq!(registry.mark_resolved("A"), ResolveOutcome::AlreadyResolved);
        assert_eq!(registry.mark_resolved("missing"), ResolveOutcome::NotFound);
        assert!(registry.peek("missing").is_none());

        let record = registry.peek("A").unwrap();
        assert_eq!(record.state, CartState::Resolved(Resolution::CheckoutStarted));
        assert!(record.resolved_at.is_some());
    }

    #[test]
    fn test_claim_loses_to_checkout() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(5000));
        registry.mark_resolved("A");
        assert!(registry.claim("A").is_none());
        assert!(registry.claim("missing").is_none());
    }

    #[test]
    fn test_claim_wins_once() {
        let registry = CartRegistry::new();
        registry.track("B", snapshot(5000));

        let claimed = registry.claim("B").unwrap();
        assert_eq!(claimed.total_minor(), 5000);
        assert!(registry.claim("B").is_none());
        assert_eq!(registry.mark_resolved("B"), ResolveOutcome::AlreadyResolved);
        assert_eq!(
            registry.peek("B").unwrap().state,
            CartState::Resolved(Resolution::Abandoned)
        );
    }

    #[test]
    fn test_peek_returns_a_copy() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(5000));
        let mut copy = registry.peek("A").unwrap();
        copy.state = CartState::Resolved(Resolution::Abandoned);
        assert!(registry.peek("A").unwrap().is_tracked());
    }

    #[test]
    fn test_remove_and_retrack() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(5000));
        assert!(registry.remove("A"));
        assert!(!registry.remove("A"));
        assert!(registry.is_empty());
        assert_eq!(registry.track("A", snapshot(100)), TrackOutcome::Started);
    }

    #[test]
    fn test_remove_created_at_spares_retracked_cart() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(5000));
        let first = registry.peek("A").unwrap().created_at;
        registry.remove("A");
        std::thread::sleep(std::time::Duration::from_millis(2));
        registry.track("A", snapshot(100));

        assert!(!registry.remove_created_at("A", first));
        assert!(registry.peek("A").unwrap().is_tracked());

        let second = registry.peek("A").unwrap().created_at;
        assert!(registry.remove_created_at("A", second));
        assert!(registry.is_empty());
        assert!(!registry.remove_created_at("missing", second));
    }

    #[test]
    fn test_counts_and_list() {
        let registry = CartRegistry::new();
        registry.track("A", snapshot(1));
        registry.track("B", snapshot(2));
        registry.mark_resolved("B");
        assert_eq!(registry.counts(), (1, 1));
        let tokens: Vec<_> = registry.list().into_iter().map(|r| r.token).collect();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains(&"A".to_string()));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        let registry = std::sync::Arc::new(CartRegistry::new());
        registry.track("C", snapshot(5000));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = registry.clone();
                std::thread::spawn(move || r.claim("C").is_some())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
