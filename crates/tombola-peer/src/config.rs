//! Peer configuration: every protocol timing constant in one place.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arbitration::Verdict;

/// Timing configuration for one peer.
///
/// The defaults are the room protocol's values. Tests shrink them (or pin
/// windows to a single value for determinism); production code has no
/// reason to touch them.
///
/// A "window" is a half-open range `[min, max)` from which a delay is drawn
/// uniformly. A window with `max <= min` always yields exactly `min`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    /// How long to wait for an `iamhost` answer before considering
    /// self-promotion. Randomized so peers starting together spread out.
    pub election_window: (Duration, Duration),

    /// Period of the "ready" poll that watches for enough players while
    /// the game hasn't started.
    pub ready_poll_period: Duration,

    /// Period between join retries after the host said `hold`.
    pub join_retry_period: Duration,

    /// Period between number calls while the game runs.
    pub draw_period: Duration,

    /// Arbitration delay before announcing a valid claim.
    pub valid_claim_window: (Duration, Duration),

    /// Arbitration delay before announcing an invalid claim.
    pub invalid_claim_window: (Duration, Duration),
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            election_window: (Duration::from_millis(5_000), Duration::from_millis(8_000)),
            ready_poll_period: Duration::from_millis(1_000),
            join_retry_period: Duration::from_millis(5_000),
            draw_period: Duration::from_millis(5_000),
            valid_claim_window: (Duration::from_millis(4_000), Duration::from_millis(8_000)),
            invalid_claim_window: (Duration::from_millis(3_000), Duration::from_millis(6_000)),
        }
    }
}

impl PeerConfig {
    /// Clamp any out-of-range values so the config is safe to run.
    ///
    /// Called by `Peer::new`. Rules: periods must be non-zero (a zero
    /// period would spin the event loop); windows with `max < min` are
    /// collapsed to `min`.
    pub fn validated(mut self) -> Self {
        const FLOOR: Duration = Duration::from_millis(1);
        for period in [
            &mut self.ready_poll_period,
            &mut self.join_retry_period,
            &mut self.draw_period,
        ] {
            if *period < FLOOR {
                warn!("zero timer period in config, clamping to 1ms");
                *period = FLOOR;
            }
        }
        for window in [
            &mut self.election_window,
            &mut self.valid_claim_window,
            &mut self.invalid_claim_window,
        ] {
            if window.1 < window.0 {
                warn!("inverted delay window in config, collapsing to its minimum");
                window.1 = window.0;
            }
        }
        self
    }

    /// The arbitration delay window for a verdict.
    pub fn arbitration_window(&self, verdict: Verdict) -> (Duration, Duration) {
        match verdict {
            Verdict::Valid => self.valid_claim_window,
            Verdict::Invalid => self.invalid_claim_window,
        }
    }
}
