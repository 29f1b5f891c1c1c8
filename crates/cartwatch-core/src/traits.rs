//! Seam between the scheduler and whatever receives abandoned carts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::CartSnapshot;

/// Destination for abandoned cart leads.
///
/// `deliver` is called at most once per cart. An `Err` means the lead was
/// not accepted; the scheduler logs it and never retries.
#[async_trait]
pub trait LeadSink: Send + Sync {
    /// Sink name, used in logs and delivery history.
    fn name(&self) -> &str;

    /// Transmit a lead built from `snapshot`.
    async fn deliver(&self, cart_token: &str, snapshot: &CartSnapshot) -> Result<()>;
}
