//! In-process fan-out of dashboard events.
//!
//! Simulators, the session store, the assistant and the optimizer publish;
//! the host feed logger and any attached views subscribe. Delivery is
//! best-effort: a slow subscriber skips ahead instead of stalling producers.

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::events::{Event, EventMessage};

/// Messages buffered per subscriber before it starts lagging.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    /// Stamp `event` and hand it to every live subscriber.
    pub fn publish(&self, event: Event) {
        let kind = event.event_type();
        let dashboard = event.dashboard_id().unwrap_or("-").to_string();
        let delivered = self.tx.send(EventMessage::new(event)).unwrap_or(0);
        debug!("{} from dashboard {} reached {} subscriber(s)", kind, dashboard, delivered);
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let rx = self.tx.subscribe();
        debug!("Event subscriber attached ({} live)", self.subscriber_count());
        EventSubscriber { rx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    rx: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next event, or `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.rx.recv().await {
                Ok(message) => break Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event subscriber fell behind, skipped {} event(s)", skipped)
                }
                Err(RecvError::Closed) => break None,
            }
        }
    }

    /// Next buffered event without waiting, or `None` if nothing is queued.
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(message) => break Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Event subscriber fell behind, skipped {} event(s)", skipped)
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
