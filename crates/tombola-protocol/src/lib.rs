//! Wire protocol for Tombola.
//!
//! This crate defines the "language" every peer in a room speaks:
//!
//! - **Types** ([`Command`], [`PeerId`]) — the messages that travel on the
//!   broadcast channel and the identity attached to them.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the bus (raw frames) and the peer state
//! machine (roster, lifecycle, arbitration). It doesn't know about rooms or
//! roles — it only knows how to name commands and serialize them.
//!
//! ```text
//! Bus (bytes) → Protocol (Command) → Peer (state machine)
//! ```
//!
//! The JSON shape of every command is a fixed interop contract: tag strings
//! and field names must not change, or existing peers in the same room stop
//! understanding us.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Command, PeerId};
