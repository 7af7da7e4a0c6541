//! Core protocol types for Tombola's wire format.
//!
//! Every message on the room channel is one JSON object with a `command`
//! tag and a small payload. This vocabulary is the protocol's fixed interop
//! contract — the tag strings and field names below must be preserved
//! byte-for-byte so that any existing peer in the room keeps understanding
//! us, whatever it is written in.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A peer's opaque identity within a room session.
///
/// Generated locally once at startup from 32 bits of entropy rendered as a
/// fixed-width hex token. Nothing registers or deduplicates identities;
/// uniqueness is probabilistic, which is plenty for one room session and
/// exactly as strong as the protocol needs (the protocol cannot verify a
/// sender's claimed identity anyway).
///
/// The `#[serde(transparent)]` attribute makes a `PeerId` serialize as the
/// bare token string, so a `clientID` field on the wire is just
/// `"clientID": "a1b2c3d4"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Draws a fresh identity from the thread-local CSPRNG.
    ///
    /// Called exactly once per peer session.
    pub fn random() -> Self {
        let raw: u32 = rand::random();
        Self(format!("{raw:08x}"))
    }

    /// Wraps an existing token. Used when echoing identities received on
    /// the wire and for fixed identities in tests.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Command — the full wire vocabulary
// ---------------------------------------------------------------------------

/// Every message a peer can broadcast to the room.
///
/// `#[serde(tag = "command")]` produces internally tagged JSON — the variant
/// name travels inside the object:
///
/// ```json
/// { "command": "iamhost", "clientID": "a1b2c3d4" }
/// ```
///
/// `rename_all = "lowercase"` flattens the variant names into the exact tag
/// strings of the room contract (`IAmHost` → `"iamhost"`, `ClaimMade` →
/// `"claimmade"`). Field renames pin the camel-case payload keys
/// (`clientID`, `calledNumbers`) the contract demands.
///
/// A note on trust: the channel is broadcast-only and unauthenticated, so
/// any peer can emit any of these — including host-only ones. Role gating
/// happens in the receiving dispatcher and is advisory, not a security
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    /// Any peer, at startup: "is there a host in this room?"
    HostIdentify,

    /// Host → all: "I am the host, this is my identity."
    /// Sent in reply to every `hostidentify`, and once on self-promotion.
    IAmHost {
        #[serde(rename = "clientID")]
        client_id: PeerId,
    },

    /// Peer → host: "let me into the game."
    Join {
        #[serde(rename = "clientID")]
        client_id: PeerId,
    },

    /// Host → all, addressed by identity: "you are in."
    /// Delivered to everyone; only the named peer acts on it.
    Joined {
        #[serde(rename = "clientID")]
        client_id: PeerId,
    },

    /// Host → all, addressed by identity: "game in progress, retry later."
    Hold {
        #[serde(rename = "clientID")]
        client_id: PeerId,
    },

    /// Departing peer → all, fire-and-forget. No acknowledgment follows.
    Leave {
        #[serde(rename = "clientID")]
        client_id: PeerId,
    },

    /// Host → all: the full authoritative roster, in join order.
    /// Receivers replace their local roster wholesale.
    Players { players: Vec<PeerId> },

    /// Host → all: the game begins. Every peer generates its card.
    Start,

    /// Host → all: back to the lobby. Game state clears, roster survives.
    Reset,

    /// Host → all: one drawn number plus the authoritative call history.
    Call {
        number: u8,
        #[serde(rename = "calledNumbers")]
        called_numbers: Vec<u8>,
    },

    /// Any peer → host: "my card wins." Carries the claimed card so the
    /// host can check it against the call history.
    Claim {
        claimer: PeerId,
        gamecard: Vec<u8>,
    },

    /// Host → all: a claim is being checked.
    ClaimMade { claimer: PeerId },

    /// Host → all: the claim held up — game over, claimer wins.
    ClaimValid { claimer: PeerId },

    /// Host → all: the claim was bogus — claimer is disqualified.
    ClaimInvalid { claimer: PeerId },
}

impl Command {
    /// The wire tag for this command. Handy for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::HostIdentify => "hostidentify",
            Self::IAmHost { .. } => "iamhost",
            Self::Join { .. } => "join",
            Self::Joined { .. } => "joined",
            Self::Hold { .. } => "hold",
            Self::Leave { .. } => "leave",
            Self::Players { .. } => "players",
            Self::Start => "start",
            Self::Reset => "reset",
            Self::Call { .. } => "call",
            Self::Claim { .. } => "claim",
            Self::ClaimMade { .. } => "claimmade",
            Self::ClaimValid { .. } => "claimvalid",
            Self::ClaimInvalid { .. } => "claiminvalid",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The room contract defines exact JSON shapes. These tests verify that
    //! our serde attributes produce that format, because a mismatch means
    //! peers running other implementations can't parse our broadcasts.

    use super::*;

    fn id(token: &str) -> PeerId {
        PeerId::new(token)
    }

    // =====================================================================
    // PeerId
    // =====================================================================

    #[test]
    fn test_peer_id_serializes_as_bare_token() {
        // `#[serde(transparent)]` means PeerId("ab") → `"ab"`, not `{"0":"ab"}`.
        let json = serde_json::to_string(&id("a1b2c3d4")).unwrap();
        assert_eq!(json, "\"a1b2c3d4\"");
    }

    #[test]
    fn test_peer_id_deserializes_from_bare_token() {
        let pid: PeerId = serde_json::from_str("\"a1b2c3d4\"").unwrap();
        assert_eq!(pid, id("a1b2c3d4"));
    }

    #[test]
    fn test_peer_id_random_is_fixed_width_hex() {
        let pid = PeerId::random();
        assert_eq!(pid.as_str().len(), 8);
        assert!(pid.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_peer_id_random_draws_differ() {
        // 32 bits of entropy: two draws colliding would be a broken RNG.
        assert_ne!(PeerId::random(), PeerId::random());
    }

    #[test]
    fn test_peer_id_display_is_token() {
        assert_eq!(id("deadbeef").to_string(), "deadbeef");
    }

    // =====================================================================
    // Command — one shape test per variant
    // =====================================================================

    #[test]
    fn test_hostidentify_json_format() {
        let json = serde_json::to_value(Command::HostIdentify).unwrap();
        assert_eq!(json, serde_json::json!({ "command": "hostidentify" }));
    }

    #[test]
    fn test_iamhost_json_format() {
        let json =
            serde_json::to_value(Command::IAmHost { client_id: id("a1b2c3d4") }).unwrap();
        assert_eq!(json["command"], "iamhost");
        assert_eq!(json["clientID"], "a1b2c3d4");
    }

    #[test]
    fn test_join_json_format() {
        let json = serde_json::to_value(Command::Join { client_id: id("0f0f0f0f") }).unwrap();
        assert_eq!(json["command"], "join");
        assert_eq!(json["clientID"], "0f0f0f0f");
    }

    #[test]
    fn test_joined_and_hold_json_format() {
        let json = serde_json::to_value(Command::Joined { client_id: id("aa") }).unwrap();
        assert_eq!(json["command"], "joined");
        assert_eq!(json["clientID"], "aa");

        let json = serde_json::to_value(Command::Hold { client_id: id("bb") }).unwrap();
        assert_eq!(json["command"], "hold");
        assert_eq!(json["clientID"], "bb");
    }

    #[test]
    fn test_leave_json_format() {
        let json = serde_json::to_value(Command::Leave { client_id: id("cc") }).unwrap();
        assert_eq!(json["command"], "leave");
        assert_eq!(json["clientID"], "cc");
    }

    #[test]
    fn test_players_json_format() {
        let json = serde_json::to_value(Command::Players {
            players: vec![id("aa"), id("bb"), id("aa")],
        })
        .unwrap();
        assert_eq!(json["command"], "players");
        // Duplicates and order are preserved — the roster is not a set.
        assert_eq!(json["players"], serde_json::json!(["aa", "bb", "aa"]));
    }

    #[test]
    fn test_start_and_reset_json_format() {
        assert_eq!(
            serde_json::to_value(Command::Start).unwrap(),
            serde_json::json!({ "command": "start" })
        );
        assert_eq!(
            serde_json::to_value(Command::Reset).unwrap(),
            serde_json::json!({ "command": "reset" })
        );
    }

    #[test]
    fn test_call_json_format() {
        let json = serde_json::to_value(Command::Call {
            number: 42,
            called_numbers: vec![7, 42],
        })
        .unwrap();
        assert_eq!(json["command"], "call");
        assert_eq!(json["number"], 42);
        assert_eq!(json["calledNumbers"], serde_json::json!([7, 42]));
    }

    #[test]
    fn test_claim_json_format() {
        let json = serde_json::to_value(Command::Claim {
            claimer: id("dd"),
            gamecard: vec![1, 2, 3],
        })
        .unwrap();
        assert_eq!(json["command"], "claim");
        assert_eq!(json["claimer"], "dd");
        assert_eq!(json["gamecard"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_claim_outcome_json_formats() {
        let json = serde_json::to_value(Command::ClaimMade { claimer: id("ee") }).unwrap();
        assert_eq!(json["command"], "claimmade");
        assert_eq!(json["claimer"], "ee");

        let json = serde_json::to_value(Command::ClaimValid { claimer: id("ee") }).unwrap();
        assert_eq!(json["command"], "claimvalid");

        let json = serde_json::to_value(Command::ClaimInvalid { claimer: id("ee") }).unwrap();
        assert_eq!(json["command"], "claiminvalid");
    }

    // =====================================================================
    // Round trips
    // =====================================================================

    #[test]
    fn test_every_variant_round_trips() {
        let commands = vec![
            Command::HostIdentify,
            Command::IAmHost { client_id: id("11") },
            Command::Join { client_id: id("22") },
            Command::Joined { client_id: id("33") },
            Command::Hold { client_id: id("44") },
            Command::Leave { client_id: id("55") },
            Command::Players { players: vec![id("11"), id("22")] },
            Command::Start,
            Command::Reset,
            Command::Call { number: 90, called_numbers: vec![90] },
            Command::Claim { claimer: id("66"), gamecard: (1..=25).collect() },
            Command::ClaimMade { claimer: id("77") },
            Command::ClaimValid { claimer: id("88") },
            Command::ClaimInvalid { claimer: id("99") },
        ];
        for cmd in commands {
            let bytes = serde_json::to_vec(&cmd).unwrap();
            let decoded: Command = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(cmd, decoded, "round trip failed for {}", cmd.tag());
        }
    }

    #[test]
    fn test_decode_wire_literal() {
        // A frame exactly as another implementation would send it.
        let raw = r#"{"command":"call","number":17,"calledNumbers":[3,17]}"#;
        let cmd: Command = serde_json::from_str(raw).unwrap();
        assert_eq!(cmd, Command::Call { number: 17, called_numbers: vec![3, 17] });
    }

    // =====================================================================
    // Error cases — malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<Command, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_command_tag_returns_error() {
        // Out-of-protocol tags must fail decoding — the dispatcher then
        // drops the frame with no side effect.
        let unknown = r#"{"command": "flytomoon", "speed": 9000}"#;
        let result: Result<Command, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_missing_field_returns_error() {
        let wrong = r#"{"command": "iamhost"}"#;
        let result: Result<Command, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_matches_wire_tag() {
        let cmd = Command::ClaimInvalid { claimer: id("aa") };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["command"], cmd.tag());
    }
}
