use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message-board entry. Insertion order is chronological order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Normalized sender address.
    pub address: String,
}

impl Message {
    /// Stamp a new message with the current time.
    pub fn now(text: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            address: address.into(),
        }
    }
}
