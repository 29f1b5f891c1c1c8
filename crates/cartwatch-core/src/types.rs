//! Cart snapshot types, deserialized from storefront cart JSON.
//!
//! Unknown fields are ignored so a full Shopify cart object can be posted
//! as-is. Prices are in minor currency units (cents).

use serde::{Deserialize, Serialize};

/// Immutable copy of a cart taken when tracking starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Customer identity, if the storefront knows who this is.
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Top-level contact email (guest checkout).
    #[serde(default)]
    pub email: Option<String>,
    /// Top-level contact phone.
    #[serde(default)]
    pub phone: Option<String>,
    /// Line items. Required: a cart without an item list is malformed.
    pub items: Vec<LineItem>,
    /// ISO currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Cart total in minor units, when the storefront supplies one.
    #[serde(default)]
    pub total_price: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price in minor units.
    #[serde(default)]
    pub price: u64,
}

fn default_quantity() -> u32 { 1 }

impl CartSnapshot {
    /// Total in minor units: `total_price` if present, else the line item sum.
    pub fn total_minor(&self) -> u64 {
        self.total_price.unwrap_or_else(|| {
            self.items
                .iter()
                .map(|i| i.price.saturating_mul(u64::from(i.quantity)))
                .fold(0u64, u64::saturating_add)
        })
    }

    /// Total rendered as major units with two decimals ("50.00").
    pub fn total_display(&self) -> String {
        format_minor_units(self.total_minor())
    }

    /// Human-readable item list: "Shirt x2, Jeans x1".
    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{} x{}", i.title, i.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Contact email, customer record first.
    pub fn contact_email(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|c| non_empty(c.email.as_deref()))
            .or_else(|| non_empty(self.email.as_deref()))
    }

    /// Contact phone, customer record first.
    pub fn contact_phone(&self) -> Option<&str> {
        self.customer
            .as_ref()
            .and_then(|c| non_empty(c.phone.as_deref()))
            .or_else(|| non_empty(self.phone.as_deref()))
    }

    pub fn first_name(&self) -> Option<&str> {
        self.customer.as_ref().and_then(|c| non_empty(c.first_name.as_deref()))
    }

    pub fn last_name(&self) -> Option<&str> {
        self.customer.as_ref().and_then(|c| non_empty(c.last_name.as_deref()))
    }
}

/// Format minor units as `major.minor` with integer arithmetic.
pub fn format_minor_units(minor: u64) -> String {
    format!("{}.{:02}", minor / 100, minor % 100)
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
