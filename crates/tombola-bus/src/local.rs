//! In-process bus implementation over `tokio::sync::broadcast`.
//!
//! One [`LocalExchange`] stands in for the relay service; each
//! [`LocalBus`] is one peer's subscription to one named room. Frames fan
//! out to every subscriber of the room, the sender included, which matches
//! the real channel's echo behavior.
//!
//! The broadcast channel has a bounded backlog: a subscriber that falls too
//! far behind loses the oldest frames (`Lagged`). We skip past the loss
//! instead of failing — the bus contract is explicit that frames may be
//! silently dropped, and every consumer is built to tolerate it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::{Bus, BusError};

/// Frames a slow subscriber can fall behind before the channel starts
/// dropping its oldest backlog.
const ROOM_BACKLOG: usize = 256;

/// An in-process relay: a set of named rooms, each a broadcast channel.
///
/// Cheap to clone — all clones share the same room table, so peers created
/// from clones of one exchange can talk to each other.
#[derive(Clone, Default)]
pub struct LocalExchange {
    rooms: Arc<Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>>,
}

impl LocalExchange {
    /// Creates an exchange with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to a room, creating it on first use.
    ///
    /// The room name is the single configuration value the core accepts
    /// from the outside (e.g. a test room vs. the production room).
    pub fn open(&self, room: &str) -> LocalBus {
        let mut rooms = self.rooms.lock().expect("room table lock poisoned");
        let tx = rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_BACKLOG).0)
            .clone();
        let rx = tx.subscribe();
        tracing::debug!(room, subscribers = tx.receiver_count(), "bus subscribed");
        LocalBus { tx, rx }
    }
}

/// One peer's connection to one room of a [`LocalExchange`].
pub struct LocalBus {
    tx: broadcast::Sender<Vec<u8>>,
    rx: broadcast::Receiver<Vec<u8>>,
}

impl Bus for LocalBus {
    type Error = BusError;

    async fn send(&self, data: &[u8]) -> Result<(), BusError> {
        // A send only fails when every receiver is gone, ours included,
        // which means this bus itself has been torn down.
        self.tx.send(data.to_vec()).map(|_| ()).map_err(|_| BusError::Closed)
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus backlog overflow, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
