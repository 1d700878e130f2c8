//! Lift change notifications.
//!
//! Every successful save or removal publishes a [`LiftEvent`] carrying the full
//! lift document. Subscribers (the SSE endpoint, tests) receive events emitted
//! after they subscribe; with no subscribers the event is dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Lift;

/// Default channel capacity. Slow subscribers lose the oldest events first.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "lift")]
pub enum LiftEvent {
    #[serde(rename = "lift:save")]
    Saved(Lift),
    #[serde(rename = "lift:remove")]
    Removed(Lift),
}

impl LiftEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Saved(_) => "lift:save",
            Self::Removed(_) => "lift:remove",
        }
    }

    pub fn lift(&self) -> &Lift {
        match self {
            Self::Saved(lift) | Self::Removed(lift) => lift,
        }
    }
}

/// Broadcast channel for [`LiftEvent`]s. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LiftEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Fire-and-forget.
    pub fn emit(&self, event: LiftEvent) {
        tracing::debug!(
            event = event.name(),
            lift_id = %event.lift().id,
            subscribers = self.tx.receiver_count(),
            "EventBus::emit"
        );
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiftEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
