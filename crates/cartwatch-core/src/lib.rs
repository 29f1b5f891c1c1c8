//! # Cartwatch Core
//!
//! Shared building blocks for the abandoned cart pipeline:
//! configuration, the common error type, cart snapshot types,
//! and the [`LeadSink`] trait the scheduler delivers through.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::CartwatchConfig;
pub use error::{CartwatchError, Result};
pub use traits::LeadSink;
pub use types::{CartSnapshot, Customer, LineItem};
