//! Broadcast message-bus abstraction for Tombola.
//!
//! Provides the [`Bus`] trait that the peer runtime consumes, plus
//! [`LocalExchange`]/[`LocalBus`], an in-process implementation used by
//! tests and demos.
//!
//! # The contract
//!
//! A bus is a best-effort room-wide broadcast channel:
//!
//! - `send` fans a frame out to every subscriber of the room — **including
//!   the sender**. No delivery acknowledgment, no ordering guarantee across
//!   receivers, duplicates possible, frames may be silently dropped under
//!   pressure.
//! - `recv` yields the next delivered frame, or `None` once the room
//!   channel is gone.
//!
//! Everything above the bus (codec, dispatcher, state machines) is designed
//! to survive these weak guarantees, so real transports (long-poll bridges,
//! relay services) only need to meet this same low bar.

#![allow(async_fn_in_trait)]

mod error;
mod local;

pub use error::BusError;
pub use local::{LocalBus, LocalExchange};

/// A best-effort broadcast channel scoped to one room.
pub trait Bus: Send + 'static {
    /// The error type for bus operations.
    type Error: std::error::Error + Send + Sync;

    /// Broadcasts a frame to every peer subscribed to the room, including
    /// the sender. Fire-and-forget: success only means the frame was handed
    /// to the channel, not that anyone received it.
    fn send(
        &self,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next delivered frame.
    ///
    /// Returns `None` when the room channel has shut down.
    fn recv(&mut self) -> impl std::future::Future<Output = Option<Vec<u8>>> + Send;
}
