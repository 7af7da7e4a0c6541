//! Claim arbitration: verifying a claimed card against the call history.
//!
//! The host is the only arbiter. The verdict is computed immediately on
//! receipt of the claim; the randomized announcement delay that follows is
//! cosmetic pacing (handled by the peer's arbitration timer) and never
//! blocks other message handling.

use tombola_protocol::PeerId;

use crate::card;

/// The outcome of checking a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Some row or column of the card is fully called. The claimer wins.
    Valid,
    /// No complete line. The claimer is disqualified for the rest of the
    /// game.
    Invalid,
}

/// A claim the host has verified but not yet announced.
///
/// Held while the arbitration delay runs; dropped on game reset.
#[derive(Debug, Clone)]
pub struct PendingClaim {
    pub claimer: PeerId,
    pub verdict: Verdict,
}

/// Checks a claimed card against the authoritative call history.
pub fn verify(gamecard: &[u8], called: &[u8]) -> Verdict {
    if card::has_winning_line(gamecard, called) {
        Verdict::Valid
    } else {
        Verdict::Invalid
    }
}
