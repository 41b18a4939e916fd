//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from any thread of control: the caller of
//! `start`/`stop`, a dedicated worker thread, a pool worker or an async task.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Receivers (many):
//!   SyncService     ──┐
//!   ThreadService   ──┤
//!   ExecutorService ──┼──► Bus ──► broadcast::Receiver (recv / try_recv / blocking_recv)
//!   CoroutineService──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and needs no runtime.
//! - **Bounded capacity**: one ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;
use crate::config::Config;

/// Broadcast channel for lifecycle events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Creates a bus sized by [`Config::bus_capacity`].
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.bus_capacity_clamped())
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_runtime_reaches_receivers() {
        let bus = Bus::new(0);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ServiceStarting).with_service("a"));

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::ServiceStarting);
        assert_eq!(ev.service.as_deref(), Some("a"));
    }

    #[test]
    fn publish_with_no_receivers_is_dropped() {
        let bus = Bus::default();
        bus.publish(Event::new(EventKind::ServiceStopped));
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
