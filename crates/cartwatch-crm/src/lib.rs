//! # Cartwatch CRM
//!
//! Turns abandoned cart snapshots into Zoho CRM leads.
//!
//! [`ZohoClient`] holds the OAuth credential in memory. A lead POST that
//! comes back 401 triggers one token refresh and one retry; any other
//! failure is reported straight away.

pub mod credentials;
pub mod lead;
pub mod zoho;

pub use credentials::Credentials;
pub use lead::build_lead;
pub use zoho::ZohoClient;
