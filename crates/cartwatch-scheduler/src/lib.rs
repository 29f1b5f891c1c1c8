//! # Cartwatch Scheduler
//!
//! In-memory cart lifecycle tracking with timer-driven abandonment checks.
//!
//! ## Architecture
//! ```text
//! track-cart ──► CartRegistry::track ──► schedule_check(grace period)
//!                                              │
//! checkout-started ──► mark_resolved ──┐       ▼ (timer fires)
//!                                      │   claim: Tracked → Resolved
//!                                      │       │
//!                                      │       ▼
//!                                      │   LeadSink::deliver
//!                                      ▼
//!                         schedule_cleanup(retention) ──► remove
//! ```
//!
//! Timers are one-shot tokio tasks with no cancellation. Each one re-reads
//! the registry when it fires and does nothing if the record moved on.

pub mod engine;
pub mod events;
pub mod records;
pub mod store;

pub use engine::{CartTracker, Timings};
pub use events::{DeliveryEvent, DeliveryOutcome, EventLog};
pub use records::{CartRecord, CartState, Resolution, ResolveOutcome, TrackOutcome};
pub use store::CartRegistry;
