//! Delivery history: what happened to each abandoned cart.
//! In-memory ring buffer; nothing is persisted.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

const MAX_HISTORY: usize = 100;

/// One delivery attempt and how it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub cart_token: String,
    /// Lead sink that handled the attempt.
    pub sink: String,
    pub outcome: DeliveryOutcome,
    /// Cart total as displayed in the lead ("50.00").
    pub total: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Bounded log of recent delivery events.
#[derive(Default)]
pub struct EventLog {
    history: Mutex<VecDeque<DeliveryEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, evicting the oldest past the cap.
    pub fn record(&self, event: DeliveryEvent) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.push_back(event);
        while history.len() > MAX_HISTORY {
            history.pop_front();
        }
    }

    /// Recent events, oldest first.
    pub fn history(&self) -> Vec<DeliveryEvent> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
