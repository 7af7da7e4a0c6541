//! Parlor: a terminal demo that wires several in-process peers through a
//! `LocalExchange` and plays one full game: election, joins, an early
//! bogus claim (and disqualification), a real win, and a reset.
//!
//! Timings are shrunk from the protocol defaults so the whole demo runs in
//! about a minute. Set `TOMBOLA_ROOM` to change the room name and
//! `RUST_LOG` to adjust verbosity.

use std::time::Duration;

use tombola_bus::LocalExchange;
use tombola_peer::{
    GameStatus, Peer, PeerConfig, PeerHandle, Presenter, TimeoutPolicy, Verdict, spawn_peer,
    verify,
};
use tombola_protocol::{JsonCodec, PeerId};
use tracing::info;

/// Renders a peer's view as log lines.
struct ConsolePresenter {
    tag: &'static str,
}

impl Presenter for ConsolePresenter {
    fn status(&mut self, text: &str) {
        info!(peer = self.tag, "{text}");
    }

    fn roster(&mut self, players: &[PeerId]) {
        let names: Vec<String> = players.iter().map(PeerId::to_string).collect();
        info!(peer = self.tag, roster = ?names, "roster changed");
    }

    fn called(&mut self, history: &[u8], latest: Option<u8>) {
        if let Some(number) = latest {
            info!(peer = self.tag, number, total = history.len(), "number called");
        }
    }
}

/// Demo timings: one call per second, short election and verdict windows.
fn demo_config() -> PeerConfig {
    PeerConfig {
        election_window: (Duration::from_secs(2), Duration::from_secs(4)),
        ready_poll_period: Duration::from_millis(500),
        join_retry_period: Duration::from_secs(2),
        draw_period: Duration::from_secs(1),
        valid_claim_window: (Duration::from_secs(1), Duration::from_secs(2)),
        invalid_claim_window: (Duration::from_secs(1), Duration::from_secs(2)),
    }
}

fn join_room(exchange: &LocalExchange, room: &str, tag: &'static str) -> PeerHandle {
    let peer = Peer::new(
        PeerId::random(),
        demo_config(),
        ConsolePresenter { tag },
        Box::new(TimeoutPolicy),
    );
    spawn_peer(peer, exchange.open(room), JsonCodec)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let room = std::env::var("TOMBOLA_ROOM").unwrap_or_else(|_| "tombola-demo".to_string());
    let exchange = LocalExchange::new();
    info!(room, "parlor starting");

    // The first peer finds nobody and self-promotes.
    let host = join_room(&exchange, &room, "morel");
    tokio::time::sleep(Duration::from_secs(5)).await;

    // Two more peers find the host and join.
    let ada = join_room(&exchange, &room, "ada");
    let bob = join_room(&exchange, &room, "bob");
    tokio::time::sleep(Duration::from_secs(1)).await;

    host.start_game();

    // Ada jumps the gun: with at most one number called her card cannot
    // have a complete line, so this claim gets her disqualified.
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    ada.claim();

    // Watch the remaining contenders and claim as soon as a card
    // completes a row or column.
    'game: loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        for handle in [&host, &bob] {
            let Some(view) = handle.snapshot().await else { break 'game };
            match view.status {
                GameStatus::Finished => break 'game,
                GameStatus::Playing => {
                    if verify(&view.card, &view.called) == Verdict::Valid {
                        info!(peer = %view.id, "card complete, claiming");
                        handle.claim();
                    }
                }
                GameStatus::Joining => {}
            }
        }
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    host.reset_game();
    tokio::time::sleep(Duration::from_secs(1)).await;

    for handle in [&ada, &bob, &host] {
        handle.leave();
        handle.shutdown();
    }
    info!("parlor finished");
}
