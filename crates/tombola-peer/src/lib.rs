//! Peer coordination and game-lifecycle engine for Tombola.
//!
//! Each participant runs one [`Peer`]: host election among anonymous
//! peers, a host-authoritative roster, the game state machine
//! (joining → playing → claim arbitration → finished → reset), the fair
//! unique-number draw protocol, and claim verification with
//! disqualification — all over a best-effort broadcast bus with no
//! ordering, no delivery guarantee, and no authentication.
//!
//! # Key types
//!
//! - [`Peer`] — the state machine; synchronous handlers, unit-testable
//! - [`PeerRuntime`] / [`spawn_peer`] — the actor event loop around it
//! - [`PeerHandle`] — local (UI) commands into a running peer
//! - [`Presenter`] — the injected presentation sink
//! - [`ElectionPolicy`] — the swappable host-election decision points
//! - [`PeerConfig`] — every protocol timing constant
//!
//! # Trust model
//!
//! Broadcasts are unauthenticated: any peer can forge any command,
//! including host-only ones. Role gating filters what a correct peer reacts
//! to; it is not a security boundary. See the dispatcher docs in
//! [`Peer::handle`].

pub mod card;
pub mod draw;

mod arbitration;
mod config;
mod election;
mod peer;
mod presenter;
mod roster;
mod runtime;

pub use arbitration::{PendingClaim, Verdict, verify};
pub use config::PeerConfig;
pub use election::{ElectionPolicy, ElectionState, TimeoutPolicy};
pub use peer::{GameState, GameStatus, PartyState, Peer, Role};
pub use presenter::{NullPresenter, Presenter};
pub use roster::Roster;
pub use runtime::{PeerCommand, PeerHandle, PeerRuntime, PeerSnapshot, spawn_peer};
