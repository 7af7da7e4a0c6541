//! The roster: an ordered, host-authoritative list of connected peers.
//!
//! On the host this is the source of truth; on every other peer it is a
//! read-only mirror, rebuilt wholesale from each `players` broadcast.
//! Broadcasting the roster is always the *caller's* job — the roster never
//! emits anything itself.

use tombola_protocol::PeerId;

/// Connected peers in join order.
///
/// Deliberately not a set: identity equality alone marks "the same peer",
/// so a peer rejoining under a fresh identity (or a duplicated join
/// delivery) legitimately grows the list. `remove` compensates by
/// clearing every occurrence.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    players: Vec<PeerId>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a peer. No uniqueness check by design.
    pub fn add(&mut self, id: PeerId) {
        self.players.push(id);
    }

    /// Removes *all* occurrences of a peer.
    pub fn remove(&mut self, id: &PeerId) {
        self.players.retain(|p| p != id);
    }

    /// Replaces the whole roster with the entries received from the host,
    /// in received order. Local additions are discarded — later host
    /// broadcasts always win, which keeps mirrors convergent even after
    /// missed join/leave events, and makes redelivery harmless.
    pub fn replace_all(&mut self, players: Vec<PeerId>) {
        self.players = players;
    }

    /// Number of entries (duplicates counted).
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// `true` when no peers are known.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether a peer appears at least once.
    pub fn contains(&self, id: &PeerId) -> bool {
        self.players.contains(id)
    }

    /// The entries in join order.
    pub fn as_slice(&self) -> &[PeerId] {
        &self.players
    }

    /// An owned copy, for the `players` broadcast.
    pub fn to_vec(&self) -> Vec<PeerId> {
        self.players.clone()
    }
}
