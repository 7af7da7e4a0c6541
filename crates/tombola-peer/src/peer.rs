//! The peer state machine: election, roster, game lifecycle, and claim
//! arbitration behind a single command dispatcher.
//!
//! A `Peer` owns all of one participant's state — nothing is ever shared
//! by reference with other peers; convergence happens only through
//! broadcasts. Handlers are synchronous: they mutate local state, arm or
//! cancel timers, and push outbound commands onto an outbox that the
//! runtime flushes to the bus. That keeps every protocol rule directly
//! unit-testable without a transport.
//!
//! Trust model: the channel is unauthenticated, so role gating here only
//! filters what *this* peer reacts to — it cannot stop a forged `start` or
//! `call` from being acted on, because the sender's claimed role is
//! unverifiable. An authenticity layer would slot into [`Peer::handle`]
//! without changing any state machine below it.

use std::collections::{HashSet, VecDeque};

use tombola_protocol::{Command, PeerId};
use tombola_timer::{Deadline, Pacer};
use tracing::{debug, info};

use crate::arbitration::{self, PendingClaim, Verdict};
use crate::card;
use crate::config::PeerConfig;
use crate::draw;
use crate::election::{ElectionPolicy, ElectionState};
use crate::presenter::Presenter;
use crate::roster::Roster;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Whether this peer currently acts as the room's authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Player,
    Host,
}

/// The game lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Lobby: joins accepted, waiting for the host to start.
    Joining,
    /// Numbers are being called.
    Playing,
    /// A claim was validated; waiting for a host reset.
    Finished,
}

/// Party membership as this peer sees it.
#[derive(Debug)]
pub struct PartyState {
    /// The last announced host, if any. On a split brain this is simply
    /// the latest announcement heard.
    pub host_id: Option<PeerId>,
    pub role: Role,
    pub roster: Roster,
}

/// Per-game state. Reset between games; the roster is not part of it.
#[derive(Debug)]
pub struct GameState {
    pub status: GameStatus,
    /// This peer's own card; empty until a game starts.
    pub card: Vec<u8>,
    /// Call history. Authoritative on the host, a mirror elsewhere.
    pub called: Vec<u8>,
    /// Peers whose claims were checked and rejected this game.
    pub disqualified: HashSet<PeerId>,
}

impl GameState {
    fn new() -> Self {
        Self {
            status: GameStatus::Joining,
            card: Vec::new(),
            called: Vec::new(),
            disqualified: HashSet::new(),
        }
    }

    /// Back to initial values. Reused, not recreated, so the struct's
    /// identity survives for the peer's whole session.
    fn reset(&mut self) {
        self.status = GameStatus::Joining;
        self.card.clear();
        self.called.clear();
        self.disqualified.clear();
    }
}

/// The five timers of the coordination protocol. Each is cancelled on the
/// transition that obsoletes its precondition.
pub(crate) struct PeerTimers {
    /// Election: waiting for `iamhost` before considering self-promotion.
    pub(crate) election: Deadline,
    /// Lobby poll watching for enough players.
    pub(crate) ready_poll: Pacer,
    /// Join retry after a `hold`.
    pub(crate) join_retry: Pacer,
    /// The host's draw loop.
    pub(crate) draw: Pacer,
    /// Arbitration announcement delay.
    pub(crate) arbitration: Deadline,
}

impl PeerTimers {
    fn new(config: &PeerConfig) -> Self {
        Self {
            election: Deadline::new("election"),
            ready_poll: Pacer::new("ready-poll", config.ready_poll_period),
            join_retry: Pacer::new("join-retry", config.join_retry_period),
            draw: Pacer::new("draw", config.draw_period),
            arbitration: Deadline::new("arbitration"),
        }
    }
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// One participant's complete coordination engine.
pub struct Peer<P: Presenter> {
    id: PeerId,
    config: PeerConfig,
    policy: Box<dyn ElectionPolicy>,
    election: ElectionState,
    party: PartyState,
    game: GameState,
    pending_claim: Option<PendingClaim>,
    pub(crate) timers: PeerTimers,
    outbox: VecDeque<Command>,
    presenter: P,
}

impl<P: Presenter> Peer<P> {
    /// Creates a peer in its initial state. Nothing is broadcast and no
    /// timer is armed until [`startup`](Self::startup).
    pub fn new(
        id: PeerId,
        config: PeerConfig,
        presenter: P,
        policy: Box<dyn ElectionPolicy>,
    ) -> Self {
        let config = config.validated();
        let timers = PeerTimers::new(&config);
        Self {
            id,
            config,
            policy,
            election: ElectionState::Seeking,
            party: PartyState {
                host_id: None,
                role: Role::Player,
                roster: Roster::new(),
            },
            game: GameState::new(),
            pending_claim: None,
            timers,
            outbox: VecDeque::new(),
            presenter,
        }
    }

    // -- read access -------------------------------------------------------

    pub fn id(&self) -> &PeerId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.party.role
    }

    pub fn host_id(&self) -> Option<&PeerId> {
        self.party.host_id.as_ref()
    }

    pub fn election_state(&self) -> ElectionState {
        self.election
    }

    pub fn status(&self) -> GameStatus {
        self.game.status
    }

    pub fn players(&self) -> &[PeerId] {
        self.party.roster.as_slice()
    }

    pub fn card(&self) -> &[u8] {
        &self.game.card
    }

    pub fn called(&self) -> &[u8] {
        &self.game.called
    }

    pub fn disqualified(&self) -> &HashSet<PeerId> {
        &self.game.disqualified
    }

    /// Takes everything queued for broadcast. Called by the runtime after
    /// each handler; tests use it to observe protocol output.
    pub fn drain_outbox(&mut self) -> Vec<Command> {
        self.outbox.drain(..).collect()
    }

    // -- session start -----------------------------------------------------

    /// Kicks off the session: ask for the host, arm the election timeout,
    /// start watching for players.
    pub fn startup(&mut self) {
        info!(peer = %self.id, "session starting");
        self.outbox.push_back(Command::HostIdentify);
        let (min, max) = self.config.election_window;
        self.timers.election.arm_within(min, max);
        self.timers.ready_poll.start();
        self.presenter.status("looking for a host");
    }

    // -- dispatcher --------------------------------------------------------

    /// Routes one inbound command to its handler.
    ///
    /// Role gating lives in the handlers: host-only commands are ignored by
    /// non-hosts, addressed commands by everyone but the addressee. There
    /// is no "unknown command" arm — out-of-protocol tags already failed to
    /// decode and never reach this point.
    pub fn handle(&mut self, command: Command) {
        debug!(peer = %self.id, command = command.tag(), "inbound");
        match command {
            Command::HostIdentify => self.on_host_identify(),
            Command::IAmHost { client_id } => self.on_iamhost(client_id),
            Command::Join { client_id } => self.on_join_request(client_id),
            Command::Joined { client_id } => self.on_joined(client_id),
            Command::Hold { client_id } => self.on_hold(client_id),
            Command::Leave { client_id } => self.on_leave(client_id),
            Command::Players { players } => self.on_players(players),
            Command::Start => self.on_start(),
            Command::Reset => self.on_reset(),
            Command::Call { number, called_numbers: _ } => self.on_call(number),
            Command::Claim { claimer, gamecard } => self.on_claim(claimer, gamecard),
            Command::ClaimMade { claimer } => self.on_claim_made(claimer),
            Command::ClaimValid { claimer } => self.on_claim_valid(claimer),
            Command::ClaimInvalid { claimer } => self.on_claim_invalid(claimer),
        }
    }

    // -- election ----------------------------------------------------------

    fn on_host_identify(&mut self) {
        // Every identify request gets an answer, even from peers we don't
        // track yet.
        if self.party.role == Role::Host {
            self.outbox.push_back(Command::IAmHost { client_id: self.id.clone() });
        }
    }

    fn on_iamhost(&mut self, announced: PeerId) {
        // Cancel before recording: a late-firing timeout must not
        // self-promote after a host has been observed.
        self.timers.election.cancel();
        if self.policy.adopt_announcement(self.party.host_id.as_ref(), &announced) {
            self.party.host_id = Some(announced.clone());
        }
        if self.election == ElectionState::Seeking {
            info!(peer = %self.id, host = %announced, "host found, joining");
            self.election = ElectionState::Joining;
            self.outbox.push_back(Command::Join { client_id: self.id.clone() });
            self.presenter.status("host found, joining the game");
        }
    }

    /// The election deadline fired without an `iamhost` answer.
    pub(crate) fn on_election_timeout(&mut self) {
        if !self.policy.should_self_promote(self.party.roster.len()) {
            // Someone is already known, so a host must be active or imminent.
            debug!(peer = %self.id, "election timeout with peers known, staying a player");
            return;
        }
        info!(peer = %self.id, "no host answered, self-promoting");
        self.election = ElectionState::SelfPromoted;
        self.party.role = Role::Host;
        self.party.host_id = Some(self.id.clone());
        self.party.roster.add(self.id.clone());
        self.presenter.roster(self.party.roster.as_slice());
        self.presenter.status("hosting the room");
        self.outbox.push_back(Command::IAmHost { client_id: self.id.clone() });
    }

    // -- join / roster sync ------------------------------------------------

    fn on_join_request(&mut self, candidate: PeerId) {
        if self.party.role != Role::Host {
            return;
        }
        if self.game.status == GameStatus::Joining {
            info!(peer = %self.id, joining = %candidate, "player joined");
            self.party.roster.add(candidate.clone());
            self.presenter.roster(self.party.roster.as_slice());
            self.outbox.push_back(Command::Joined { client_id: candidate });
            self.outbox.push_back(Command::Players { players: self.party.roster.to_vec() });
        } else {
            debug!(peer = %self.id, held = %candidate, "join during a game, holding");
            self.outbox.push_back(Command::Hold { client_id: candidate });
        }
    }

    fn on_joined(&mut self, addressed: PeerId) {
        // Delivered to everyone; only the addressee acts. The roster
        // rebroadcast that follows keeps the rest in sync.
        if addressed != self.id {
            return;
        }
        self.timers.join_retry.stop();
        self.election = ElectionState::Joined;
        self.presenter.status("joined, waiting for the game to start");
    }

    fn on_hold(&mut self, addressed: PeerId) {
        if addressed != self.id || self.election != ElectionState::Joining {
            return;
        }
        debug!(peer = %self.id, "held by the host, retrying periodically");
        self.timers.join_retry.start();
        self.presenter.status("game in progress, waiting to join");
    }

    /// The join retry pacer ticked: ask again until a `joined` names us.
    pub(crate) fn on_join_retry(&mut self) {
        self.outbox.push_back(Command::Join { client_id: self.id.clone() });
    }

    fn on_leave(&mut self, leaver: PeerId) {
        if self.party.role != Role::Host {
            return;
        }
        info!(peer = %self.id, leaver = %leaver, "player left");
        self.party.roster.remove(&leaver);
        self.presenter.roster(self.party.roster.as_slice());
        self.outbox.push_back(Command::Players { players: self.party.roster.to_vec() });
    }

    fn on_players(&mut self, players: Vec<PeerId>) {
        // Wholesale replacement on mirrors only; the host's own copy is
        // the authority and ignores its echo.
        if self.party.role == Role::Host {
            return;
        }
        self.party.roster.replace_all(players);
        self.presenter.roster(self.party.roster.as_slice());
    }

    // -- lifecycle ---------------------------------------------------------

    /// The lobby poll ticked: enable start for a host with company.
    pub(crate) fn on_ready_poll(&mut self) {
        if self.game.status == GameStatus::Playing {
            self.timers.ready_poll.stop();
            return;
        }
        if self.party.role == Role::Host && self.party.roster.len() > 1 {
            self.presenter.start_enabled(true);
            self.presenter.status("players ready, you can start the game");
            self.timers.ready_poll.stop();
        } else {
            self.presenter.status("waiting for players");
        }
    }

    fn on_start(&mut self) {
        if self.game.status == GameStatus::Playing {
            // Redelivery: the card must not be regenerated mid-game.
            return;
        }
        info!(peer = %self.id, "game started");
        self.timers.ready_poll.stop();
        self.game.status = GameStatus::Playing;
        self.game.card = card::generate();
        self.presenter.card(
            &self.game.card,
            &card::matched_marks(&self.game.card, &self.game.called),
        );
        self.presenter.start_enabled(false);
        self.presenter.claim_enabled(true);
        self.presenter.status("game on");
        if self.party.role == Role::Host {
            self.timers.draw.start();
        }
    }

    fn on_reset(&mut self) {
        info!(peer = %self.id, "game reset");
        self.game.reset();
        self.pending_claim = None;
        self.timers.draw.stop();
        self.timers.arbitration.cancel();
        self.timers.ready_poll.start();
        self.presenter.card(&[], &[]);
        self.presenter.called(&[], None);
        self.presenter.start_enabled(false);
        self.presenter.reset_enabled(false);
        self.presenter.claim_enabled(false);
        self.presenter.status("waiting for players");
    }

    /// The draw pacer ticked: call the next number.
    pub(crate) fn on_draw_tick(&mut self) {
        if self.game.called.len() >= usize::from(card::CALL_MAX) {
            self.timers.draw.stop();
            return;
        }
        let number = draw::excluding(card::CALL_MIN, card::CALL_MAX, &self.game.called);
        self.game.called.push(number);
        self.render_calls(number);
        self.outbox.push_back(Command::Call {
            number,
            called_numbers: self.game.called.clone(),
        });
        if self.game.called.len() >= usize::from(card::CALL_MAX) {
            // Range exhausted with no winner: the loop halts and the game
            // stays open until the host resets.
            info!(peer = %self.id, "every number called, draw loop stopped");
            self.timers.draw.stop();
        }
    }

    fn on_call(&mut self, number: u8) {
        // The host already appended at draw time; mirrors append here.
        // Redelivered calls are dropped by value so the history stays
        // unique even on an at-least-once transport.
        if self.party.role != Role::Host && !self.game.called.contains(&number) {
            self.game.called.push(number);
        }
        self.render_calls(number);
    }

    fn render_calls(&mut self, latest: u8) {
        self.presenter.called(&self.game.called, Some(latest));
        self.presenter.card(
            &self.game.card,
            &card::matched_marks(&self.game.card, &self.game.called),
        );
    }

    // -- claim arbitration -------------------------------------------------

    fn on_claim(&mut self, claimer: PeerId, gamecard: Vec<u8>) {
        if self.party.role != Role::Host {
            return;
        }
        if self.game.disqualified.contains(&claimer) {
            debug!(peer = %self.id, %claimer, "claim from disqualified peer dropped");
            return;
        }
        let verdict = arbitration::verify(&gamecard, &self.game.called);
        info!(peer = %self.id, %claimer, ?verdict, "claim under arbitration");
        self.timers.draw.pause();
        self.outbox.push_back(Command::ClaimMade { claimer: claimer.clone() });
        let (min, max) = self.config.arbitration_window(verdict);
        self.timers.arbitration.arm_within(min, max);
        self.pending_claim = Some(PendingClaim { claimer, verdict });
    }

    fn on_claim_made(&mut self, claimer: PeerId) {
        self.presenter.status(&format!("checking claim from {claimer}"));
    }

    /// The arbitration delay elapsed: announce the verdict.
    pub(crate) fn on_arbitration_due(&mut self) {
        let Some(PendingClaim { claimer, verdict }) = self.pending_claim.take() else {
            return;
        };
        match verdict {
            Verdict::Valid => {
                info!(peer = %self.id, %claimer, "claim valid, game over");
                self.outbox.push_back(Command::ClaimValid { claimer });
            }
            Verdict::Invalid => {
                info!(peer = %self.id, %claimer, "claim invalid, disqualifying");
                self.game.disqualified.insert(claimer.clone());
                self.outbox.push_back(Command::ClaimInvalid { claimer });
                self.timers.draw.resume();
            }
        }
    }

    fn on_claim_valid(&mut self, claimer: PeerId) {
        self.game.status = GameStatus::Finished;
        self.timers.draw.stop();
        self.timers.arbitration.cancel();
        self.pending_claim = None;
        self.presenter.claim_enabled(false);
        self.presenter.reset_enabled(self.party.role == Role::Host);
        self.presenter.status(&format!("{claimer} wins"));
    }

    fn on_claim_invalid(&mut self, claimer: PeerId) {
        // The host inserted at arbitration time; the insert is idempotent
        // so its own echo (and redeliveries) are harmless.
        self.game.disqualified.insert(claimer.clone());
        self.presenter.status(&format!("claim by {claimer} rejected, claimer disqualified"));
    }

    // -- local (UI) actions ------------------------------------------------

    /// Start button. Gated on hosting a lobby with company; the state
    /// transition itself happens when our own broadcast echoes back.
    pub fn start_game(&mut self) {
        if self.party.role == Role::Host
            && self.game.status == GameStatus::Joining
            && self.party.roster.len() > 1
        {
            self.outbox.push_back(Command::Start);
        }
    }

    /// Reset button. Host-only, once a game has finished.
    pub fn reset_game(&mut self) {
        if self.party.role == Role::Host && self.game.status == GameStatus::Finished {
            self.outbox.push_back(Command::Reset);
        }
    }

    /// Claim button: assert that our card wins. The host arbitrates like
    /// any other claim once the broadcast comes back around.
    pub fn claim(&mut self) {
        if self.game.status == GameStatus::Playing && !self.game.card.is_empty() {
            self.outbox.push_back(Command::Claim {
                claimer: self.id.clone(),
                gamecard: self.game.card.clone(),
            });
        }
    }

    /// Announce departure, best-effort. No acknowledgment is expected.
    pub fn leave(&mut self) {
        self.outbox.push_back(Command::Leave { client_id: self.id.clone() });
    }
}

// =========================================================================
// Tests
// =========================================================================
