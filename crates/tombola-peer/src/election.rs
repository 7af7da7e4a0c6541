//! Host election: who becomes the authoritative peer, and when.
//!
//! Election over an unreliable broadcast channel with no quorum primitive
//! cannot guarantee a single leader: two peers starting within the same few
//! hundred milliseconds can both observe an empty roster, both time out,
//! and both self-promote. The protocol has no mechanism to detect or
//! resolve that split brain — the decision points are therefore isolated
//! behind [`ElectionPolicy`] so a smarter strategy (e.g. lowest-identity
//! tie-break on hearing a rival `iamhost`) can be substituted without
//! touching the lifecycle or claim logic.

use tombola_protocol::PeerId;

/// Where this peer stands in the election/join sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionState {
    /// Broadcast `hostidentify`, waiting for an answer or the timeout.
    Seeking,
    /// A host answered; our `join` is out (possibly being retried).
    Joining,
    /// The host acknowledged us by identity.
    Joined,
    /// The timeout fired with nobody known — we are the host.
    SelfPromoted,
}

/// The election decision points, separated from the mechanics.
pub trait ElectionPolicy: Send + 'static {
    /// Called when the election deadline fires. `known_peers` is the
    /// roster size observed at that moment. Returning `true` makes this
    /// peer the host.
    fn should_self_promote(&self, known_peers: usize) -> bool;

    /// Called for every `iamhost` announcement. Returning `true` records
    /// `announced` as the current host.
    fn adopt_announcement(&self, current: Option<&PeerId>, announced: &PeerId) -> bool;
}

/// The protocol's timeout heuristic.
///
/// Self-promote only when nobody is known, and let the latest announcement
/// win unconditionally — faithful to the room protocol, split brain
/// included.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutPolicy;

impl ElectionPolicy for TimeoutPolicy {
    fn should_self_promote(&self, known_peers: usize) -> bool {
        known_peers == 0
    }

    fn adopt_announcement(&self, _current: Option<&PeerId>, _announced: &PeerId) -> bool {
        true
    }
}
