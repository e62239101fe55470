//! Subscriber fanout
//!
//! Best-effort broadcast of reconciliation results to all live
//! subscribers. Publishing never blocks the ingestion caller: messages
//! go through a bounded broadcast channel, a subscriber that falls too
//! far behind is dropped by its own stream, and delivery errors never
//! propagate back.

use punchd_common::events::AttendanceUpdate;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Messages carried on the fanout channel
#[derive(Debug, Clone)]
pub enum FanoutMessage {
    /// A reconciliation mutated an aggregate
    Attendance(AttendanceUpdate),
    /// Service is stopping; every subscriber stream ends
    Shutdown,
}

/// Fanout manages subscriber connections and event distribution
#[derive(Clone)]
pub struct Fanout {
    tx: broadcast::Sender<FanoutMessage>,
}

impl Fanout {
    /// Create a new fanout with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        info!("Subscriber fanout initialized with capacity {}", capacity);
        Self { tx }
    }

    /// Broadcast an update to all connected subscribers, ignoring
    /// delivery failures (no subscribers is fine)
    pub fn publish(&self, update: AttendanceUpdate) {
        match self.tx.send(FanoutMessage::Attendance(update)) {
            Ok(count) => debug!("Published attendance update to {} subscribers", count),
            Err(_) => debug!("No subscribers connected, update dropped"),
        }
    }

    /// Signal every subscriber stream to close
    pub fn shutdown(&self) {
        let _ = self.tx.send(FanoutMessage::Shutdown);
    }

    /// Current number of connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Subscribe to the fanout channel; used by the SSE handler on
    /// every new subscriber connection
    pub fn subscribe(&self) -> broadcast::Receiver<FanoutMessage> {
        self.tx.subscribe()
    }
}
