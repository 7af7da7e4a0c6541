//! End-to-end coordination tests: several peer actors on one in-process
//! bus, driven deterministically under Tokio's paused clock.
//!
//! Message exchanges settle "instantly" (the clock only advances when every
//! task is idle), so short sleeps let arbitrary ping-pong complete while
//! long sleeps step over timer windows. The test config pins every
//! randomized window to a single value so timings are exact.

use std::time::Duration;

use tombola_bus::{Bus, LocalExchange};
use tombola_peer::{
    ElectionState, GameStatus, NullPresenter, Peer, PeerConfig, PeerHandle, PeerSnapshot, Role,
    TimeoutPolicy, spawn_peer,
};
use tombola_protocol::{Codec, Command, JsonCodec, PeerId};

const ROOM: &str = "coordination-test";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Protocol timings pinned for determinism: the election resolves at
/// exactly 2s, draws land every 5s, verdicts land 4s (valid) / 3s
/// (invalid) after the claim.
fn test_config() -> PeerConfig {
    PeerConfig {
        election_window: (ms(2_000), ms(2_000)),
        ready_poll_period: ms(1_000),
        join_retry_period: ms(5_000),
        draw_period: ms(5_000),
        valid_claim_window: (ms(4_000), ms(4_000)),
        invalid_claim_window: (ms(3_000), ms(3_000)),
    }
}

fn spawn(exchange: &LocalExchange, token: &str) -> PeerHandle {
    let peer = Peer::new(
        PeerId::new(token),
        test_config(),
        NullPresenter,
        Box::new(TimeoutPolicy),
    );
    spawn_peer(peer, exchange.open(ROOM), JsonCodec)
}

/// Lets in-flight message exchanges finish without crossing any timer.
async fn settle() {
    tokio::time::sleep(ms(50)).await;
}

async fn snap(handle: &PeerHandle) -> PeerSnapshot {
    handle.snapshot().await.expect("peer actor is gone")
}

/// Injects a raw frame as if some (possibly forged) peer had sent it.
async fn inject(exchange: &LocalExchange, command: &Command) {
    let bus = exchange.open(ROOM);
    let bytes = JsonCodec.encode(command).unwrap();
    bus.send(&bytes).await.unwrap();
}

/// Spawns a host and waits out its election window.
async fn spawn_host(exchange: &LocalExchange, token: &str) -> PeerHandle {
    let handle = spawn(exchange, token);
    tokio::time::sleep(ms(2_100)).await;
    handle
}

// =========================================================================
// Election
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_solo_peer_self_promotes() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;

    let snap_a = snap(&a).await;
    assert_eq!(snap_a.role, Role::Host);
    assert_eq!(snap_a.election, ElectionState::SelfPromoted);
    assert_eq!(snap_a.host_id, Some(PeerId::new("aaaa0001")));
    assert_eq!(snap_a.players, vec![PeerId::new("aaaa0001")]);
    assert_eq!(snap_a.status, GameStatus::Joining);
}

#[tokio::test(start_paused = true)]
async fn test_second_peer_joins_the_running_host() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    settle().await;

    let snap_b = snap(&b).await;
    assert_eq!(snap_b.role, Role::Player);
    assert_eq!(snap_b.election, ElectionState::Joined);
    assert_eq!(snap_b.host_id, Some(PeerId::new("aaaa0001")));
    // The roster mirror converged through the players broadcast.
    assert_eq!(snap_b.players, vec![PeerId::new("aaaa0001"), PeerId::new("bbbb0002")]);

    let snap_a = snap(&a).await;
    assert_eq!(snap_a.players, snap_b.players);
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_start_elects_at_least_one_host() {
    // Two peers inside the same election window may both self-promote —
    // the protocol has no quorum and accepts that split brain. What must
    // hold is liveness: somebody ends up hosting.
    let exchange = LocalExchange::new();
    let a = spawn(&exchange, "aaaa0001");
    let b = spawn(&exchange, "bbbb0002");
    tokio::time::sleep(ms(2_500)).await;

    let roles = [snap(&a).await.role, snap(&b).await.role];
    assert!(roles.contains(&Role::Host), "no peer took the host role");
}

#[tokio::test(start_paused = true)]
async fn test_out_of_protocol_frames_are_ignored() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;

    let bus = exchange.open(ROOM);
    bus.send(b"not json at all").await.unwrap();
    bus.send(br#"{"command":"flytomoon","speed":9000}"#).await.unwrap();
    settle().await;

    let snap_a = snap(&a).await;
    assert_eq!(snap_a.role, Role::Host);
    assert_eq!(snap_a.status, GameStatus::Joining);
    assert_eq!(snap_a.players, vec![PeerId::new("aaaa0001")]);
}

// =========================================================================
// Start and draws
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_deals_cards_and_calls_converge() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    settle().await;

    a.start_game();
    settle().await;

    let snap_a = snap(&a).await;
    let snap_b = snap(&b).await;
    assert_eq!(snap_a.status, GameStatus::Playing);
    assert_eq!(snap_b.status, GameStatus::Playing);
    // Cards are personal, 25 numbers each.
    assert_eq!(snap_a.card.len(), 25);
    assert_eq!(snap_b.card.len(), 25);
    assert!(snap_a.called.is_empty());

    // Three draw periods → three calls, mirrored exactly.
    tokio::time::sleep(ms(15_100)).await;
    let snap_a = snap(&a).await;
    let snap_b = snap(&b).await;
    assert_eq!(snap_a.called.len(), 3);
    assert_eq!(snap_a.called, snap_b.called);
}

#[tokio::test(start_paused = true)]
async fn test_non_host_cannot_start_the_game() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    settle().await;

    b.start_game();
    settle().await;

    assert_eq!(snap(&a).await.status, GameStatus::Joining);
    assert_eq!(snap(&b).await.status, GameStatus::Joining);
}

// =========================================================================
// Claims
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_invalid_claim_disqualifies_then_silences_the_claimer() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    settle().await;
    a.start_game();

    // One call so far — no card can have a complete line yet.
    tokio::time::sleep(ms(5_100)).await;
    b.claim();
    settle().await;

    // Invalid verdict lands 3s later: both sides record the
    // disqualification.
    tokio::time::sleep(ms(3_100)).await;
    let snap_a = snap(&a).await;
    let snap_b = snap(&b).await;
    assert!(snap_a.disqualified.contains(&PeerId::new("bbbb0002")));
    assert!(snap_b.disqualified.contains(&PeerId::new("bbbb0002")));
    assert_eq!(snap_a.status, GameStatus::Playing, "an invalid claim must not end the game");

    // The draw loop resumed after the verdict.
    let before = snap_a.called.len();
    tokio::time::sleep(ms(5_100)).await;
    assert!(snap(&a).await.called.len() > before, "draw loop did not resume");

    // A second claim from the disqualified peer is dropped silently: a spy
    // on the bus sees the claim frame go out but no arbitration reaction.
    let mut spy = exchange.open(ROOM);
    b.claim();
    settle().await;

    let mut seen = Vec::new();
    while let Ok(Some(frame)) = tokio::time::timeout(ms(10), spy.recv()).await {
        if let Ok(cmd) = JsonCodec.decode::<Command>(&frame) {
            seen.push(cmd.tag());
        }
    }
    assert!(seen.contains(&"claim"), "the claim frame itself should be visible");
    assert!(!seen.contains(&"claimmade"), "host reacted to a disqualified claimer");
    assert!(!seen.contains(&"claiminvalid"));
    assert!(!seen.contains(&"claimvalid"));
}

#[tokio::test(start_paused = true)]
async fn test_full_game_with_held_join_and_reset() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    settle().await;
    a.start_game();
    settle().await;

    // A latecomer is held while the game runs: no roster change.
    let c = spawn(&exchange, "cccc0003");
    settle().await;
    let snap_c = snap(&c).await;
    assert_eq!(snap_c.election, ElectionState::Joining);
    assert_eq!(snap_c.host_id, Some(PeerId::new("aaaa0001")));
    assert_eq!(
        snap(&a).await.players,
        vec![PeerId::new("aaaa0001"), PeerId::new("bbbb0002")]
    );

    // Five calls, then forge a winning claim for b: its first "row" is
    // exactly the five called numbers. (Anyone can forge anything on this
    // bus — the host cannot tell.)
    tokio::time::sleep(ms(25_100)).await;
    let called = snap(&a).await.called;
    assert!(called.len() >= 5);

    let mut gamecard: Vec<u8> = called[..5].to_vec();
    let mut filler: u8 = 1;
    while gamecard.len() < 25 {
        if !called.contains(&filler) && !gamecard.contains(&filler) {
            gamecard.push(filler);
        }
        filler += 1;
    }
    inject(
        &exchange,
        &Command::Claim { claimer: PeerId::new("bbbb0002"), gamecard },
    )
    .await;
    settle().await;

    // Valid verdict lands 4s later: everyone sees the game finish.
    tokio::time::sleep(ms(4_100)).await;
    assert_eq!(snap(&a).await.status, GameStatus::Finished);
    assert_eq!(snap(&b).await.status, GameStatus::Finished);

    // No more calls after the win.
    let final_calls = snap(&a).await.called.len();
    tokio::time::sleep(ms(10_100)).await;
    assert_eq!(snap(&a).await.called.len(), final_calls);

    // Host resets: game state clears, the roster survives.
    a.reset_game();
    settle().await;
    let snap_a = snap(&a).await;
    assert_eq!(snap_a.status, GameStatus::Joining);
    assert!(snap_a.card.is_empty());
    assert!(snap_a.called.is_empty());
    assert!(snap_a.disqualified.is_empty());
    assert_eq!(
        snap_a.players,
        vec![PeerId::new("aaaa0001"), PeerId::new("bbbb0002")]
    );
    assert_eq!(snap(&b).await.status, GameStatus::Joining);

    // The held latecomer's next retry now succeeds.
    tokio::time::sleep(ms(5_100)).await;
    assert_eq!(snap(&c).await.election, ElectionState::Joined);
    let players = snap(&a).await.players;
    assert_eq!(
        players,
        vec![
            PeerId::new("aaaa0001"),
            PeerId::new("bbbb0002"),
            PeerId::new("cccc0003"),
        ]
    );
}

// =========================================================================
// Departure
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_leave_shrinks_the_roster_everywhere() {
    let exchange = LocalExchange::new();
    let a = spawn_host(&exchange, "aaaa0001").await;
    let b = spawn(&exchange, "bbbb0002");
    let c = spawn(&exchange, "cccc0003");
    settle().await;
    assert_eq!(snap(&a).await.players.len(), 3);

    b.leave();
    settle().await;

    let expected = vec![PeerId::new("aaaa0001"), PeerId::new("cccc0003")];
    assert_eq!(snap(&a).await.players, expected);
    assert_eq!(snap(&c).await.players, expected);
}
