//! Lead payload builder (Zoho Leads API v7 shape).

use cartwatch_core::CartSnapshot;
use cartwatch_core::config::CrmConfig;
use serde_json::{Value, json};

/// Build the `{ "data": [ {lead} ] }` body for one abandoned cart.
///
/// Missing customer fields fall back to `config.lead` defaults.
pub fn build_lead(snapshot: &CartSnapshot, config: &CrmConfig) -> Value {
    let defaults = &config.lead;
    let total = snapshot.total_display();
    let currency = snapshot.currency.as_deref().unwrap_or("");

    let description = if currency.is_empty() {
        format!("Abandoned cart total {total} | Items: {}", snapshot.items_summary())
    } else {
        format!(
            "Abandoned cart total {currency} {total} | Items: {}",
            snapshot.items_summary()
        )
    };

    let mut lead = json!({
        "First_Name": snapshot.first_name().unwrap_or(defaults.first_name.as_str()),
        "Last_Name": snapshot.last_name().unwrap_or(defaults.last_name.as_str()),
        "Email": snapshot.contact_email().unwrap_or(defaults.email.as_str()),
        "Phone": snapshot.contact_phone().unwrap_or(defaults.phone.as_str()),
        "Street": defaults.street,
        "City": defaults.city,
        "State": defaults.state,
        "Country": defaults.country,
        "Zip_Code": defaults.zip_code,
        "Description": description,
        "Cart_Total": total,
        "Lead_Source": defaults.lead_source,
        "Lead_Status": defaults.lead_status,
    });

    if !currency.is_empty() {
        lead["Currency"] = json!(currency);
    }
    if let Some(layout_id) = config.layout_id.as_deref().filter(|id| !id.is_empty()) {
        lead["Layout"] = json!({ "id": layout_id });
    }

    json!({ "data": [lead] })
}
