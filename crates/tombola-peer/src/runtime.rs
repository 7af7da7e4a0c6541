//! The peer actor: one Tokio task that owns a [`Peer`] and drives it from
//! bus frames, timer expirations, and local (UI) commands.
//!
//! This is the cooperative event loop of the design: a single logical
//! thread of control per peer, no shared mutable state, every wake handled
//! to completion before the next. Handlers queue broadcasts on the peer's
//! outbox; the loop flushes the outbox to the bus after every wake, so
//! sends are fire-and-forget from the handlers' point of view.

use std::collections::HashSet;

use tokio::sync::{mpsc, oneshot};
use tombola_bus::Bus;
use tombola_protocol::{Codec, Command, PeerId};
use tracing::{debug, info, trace, warn};

use crate::election::ElectionState;
use crate::peer::{GameStatus, Peer, Role};
use crate::presenter::Presenter;

/// Local commands a UI (or test) can send to a running peer.
///
/// These are the button presses of the design: they enter the same
/// dispatcher path as inbound broadcasts, just from the other side.
pub enum PeerCommand {
    /// Host presses "start".
    StartGame,
    /// Host presses "reset".
    ResetGame,
    /// This peer asserts its card wins.
    Claim,
    /// Announce departure (best-effort); the peer keeps running.
    Leave,
    /// Request a copy of the peer's current state.
    Snapshot { reply: oneshot::Sender<PeerSnapshot> },
    /// Stop the actor.
    Shutdown,
}

/// A point-in-time copy of a peer's observable state.
#[derive(Debug, Clone)]
pub struct PeerSnapshot {
    pub id: PeerId,
    pub role: Role,
    pub host_id: Option<PeerId>,
    pub election: ElectionState,
    pub status: GameStatus,
    pub players: Vec<PeerId>,
    pub card: Vec<u8>,
    pub called: Vec<u8>,
    pub disqualified: HashSet<PeerId>,
}

/// Handle to a running peer actor. Cheap to clone.
#[derive(Clone)]
pub struct PeerHandle {
    id: PeerId,
    sender: mpsc::UnboundedSender<PeerCommand>,
}

impl PeerHandle {
    /// The identity of the peer behind this handle.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Host-only in effect: ignored unless the peer hosts a ready lobby.
    pub fn start_game(&self) {
        let _ = self.sender.send(PeerCommand::StartGame);
    }

    /// Host-only in effect: ignored unless the peer hosts a finished game.
    pub fn reset_game(&self) {
        let _ = self.sender.send(PeerCommand::ResetGame);
    }

    /// Claim a win with the peer's own card.
    pub fn claim(&self) {
        let _ = self.sender.send(PeerCommand::Claim);
    }

    /// Broadcast a leave notice. Fire-and-forget by protocol design.
    pub fn leave(&self) {
        let _ = self.sender.send(PeerCommand::Leave);
    }

    /// Fetches the peer's current state. `None` if the actor is gone.
    pub async fn snapshot(&self) -> Option<PeerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.sender.send(PeerCommand::Snapshot { reply }).ok()?;
        rx.await.ok()
    }

    /// Stops the actor.
    pub fn shutdown(&self) {
        let _ = self.sender.send(PeerCommand::Shutdown);
    }
}

/// What woke the event loop. Resolved by `select!`, acted on afterwards so
/// every handler gets exclusive access to the peer.
enum Wake {
    Command(PeerCommand),
    Frame(Vec<u8>),
    ElectionTimeout,
    ReadyPoll,
    JoinRetry,
    DrawTick,
    ArbitrationDue,
    BusClosed,
    HandleDropped,
}

/// Owns a [`Peer`] plus its bus and codec, and runs the event loop.
pub struct PeerRuntime<B: Bus, C: Codec, P: Presenter> {
    peer: Peer<P>,
    bus: B,
    codec: C,
    commands: mpsc::UnboundedReceiver<PeerCommand>,
}

impl<B: Bus, C: Codec, P: Presenter> PeerRuntime<B, C, P> {
    /// Wraps a peer for running. Returns the runtime and its handle.
    pub fn new(peer: Peer<P>, bus: B, codec: C) -> (Self, PeerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = PeerHandle { id: peer.id().clone(), sender: tx };
        (Self { peer, bus, codec, commands: rx }, handle)
    }

    /// Runs the actor until shutdown, handle drop, or bus closure.
    pub async fn run(mut self) {
        info!(peer = %self.peer.id(), "peer actor started");
        self.peer.startup();
        self.flush().await;

        loop {
            let wake = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => Wake::Command(cmd),
                    None => Wake::HandleDropped,
                },
                frame = self.bus.recv() => match frame {
                    Some(frame) => Wake::Frame(frame),
                    None => Wake::BusClosed,
                },
                _ = self.peer.timers.election.fired() => Wake::ElectionTimeout,
                _ = self.peer.timers.ready_poll.ticked() => Wake::ReadyPoll,
                _ = self.peer.timers.join_retry.ticked() => Wake::JoinRetry,
                _ = self.peer.timers.draw.ticked() => Wake::DrawTick,
                _ = self.peer.timers.arbitration.fired() => Wake::ArbitrationDue,
            };

            match wake {
                Wake::Command(PeerCommand::StartGame) => self.peer.start_game(),
                Wake::Command(PeerCommand::ResetGame) => self.peer.reset_game(),
                Wake::Command(PeerCommand::Claim) => self.peer.claim(),
                Wake::Command(PeerCommand::Leave) => self.peer.leave(),
                Wake::Command(PeerCommand::Snapshot { reply }) => {
                    let _ = reply.send(self.snapshot());
                }
                Wake::Command(PeerCommand::Shutdown) => {
                    info!(peer = %self.peer.id(), "peer actor shutting down");
                    break;
                }
                Wake::Frame(frame) => match self.codec.decode::<Command>(&frame) {
                    Ok(command) => self.peer.handle(command),
                    // Out-of-protocol traffic: drop with no side effect.
                    Err(e) => debug!(peer = %self.peer.id(), error = %e, "undecodable frame ignored"),
                },
                Wake::ElectionTimeout => self.peer.on_election_timeout(),
                Wake::ReadyPoll => self.peer.on_ready_poll(),
                Wake::JoinRetry => self.peer.on_join_retry(),
                Wake::DrawTick => self.peer.on_draw_tick(),
                Wake::ArbitrationDue => self.peer.on_arbitration_due(),
                Wake::BusClosed => {
                    info!(peer = %self.peer.id(), "bus closed, peer actor stopping");
                    break;
                }
                Wake::HandleDropped => {
                    debug!(peer = %self.peer.id(), "all handles dropped, peer actor stopping");
                    break;
                }
            }

            self.flush().await;
        }

        info!(peer = %self.peer.id(), "peer actor stopped");
    }

    /// Broadcasts everything the handlers queued. Failures are logged and
    /// dropped — the transport is best-effort by contract.
    async fn flush(&mut self) {
        for command in self.peer.drain_outbox() {
            trace!(peer = %self.peer.id(), command = command.tag(), "outbound");
            match self.codec.encode(&command) {
                Ok(bytes) => {
                    if let Err(e) = self.bus.send(&bytes).await {
                        warn!(peer = %self.peer.id(), error = %e, "broadcast failed, frame dropped");
                    }
                }
                Err(e) => warn!(peer = %self.peer.id(), error = %e, "encode failed, frame dropped"),
            }
        }
    }

    fn snapshot(&self) -> PeerSnapshot {
        PeerSnapshot {
            id: self.peer.id().clone(),
            role: self.peer.role(),
            host_id: self.peer.host_id().cloned(),
            election: self.peer.election_state(),
            status: self.peer.status(),
            players: self.peer.players().to_vec(),
            card: self.peer.card().to_vec(),
            called: self.peer.called().to_vec(),
            disqualified: self.peer.disqualified().clone(),
        }
    }
}

/// Spawns a peer actor task and returns its handle.
pub fn spawn_peer<B, C, P>(peer: Peer<P>, bus: B, codec: C) -> PeerHandle
where
    B: Bus,
    C: Codec,
    P: Presenter,
{
    let (runtime, handle) = PeerRuntime::new(peer, bus, codec);
    tokio::spawn(runtime.run());
    handle
}
