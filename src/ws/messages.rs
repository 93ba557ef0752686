//! WebSocket message envelope for watch events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::WatchEvent;

/// Envelope wrapping each event sent on a watch connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchMessage {
    /// Server-generated message ID.
    pub id: String,
    /// Position of this event on its connection, starting at 0.
    pub sequence: u64,
    /// ISO-8601 send time.
    pub timestamp: DateTime<Utc>,
    /// The event itself. Always `{}`.
    pub payload: WatchEvent,
}

impl WatchMessage {
    /// Wraps `payload` as the `sequence`-th event of a connection.
    #[must_use]
    pub fn new(sequence: u64, payload: WatchEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            timestamp: Utc::now(),
            payload,
        }
    }
}
