//! The presentation sink: the narrow interface the core drives the UI
//! through.
//!
//! The engine never owns UI objects — it is handed a [`Presenter`] and
//! pushes renderable state into it. Every method has a no-op default so an
//! implementation only overrides the slots it renders.

use tombola_protocol::PeerId;

/// Renderable slots the core pushes into.
///
/// Calls are made from the peer's event loop and must not block.
pub trait Presenter: Send + 'static {
    /// Free-form status line ("waiting for players", "checking claim…").
    fn status(&mut self, _text: &str) {}

    /// The roster, in join order, after any change.
    fn roster(&mut self, _players: &[PeerId]) {}

    /// The call history plus the most recent number, after each call.
    fn called(&mut self, _history: &[u8], _latest: Option<u8>) {}

    /// The peer's own card with per-position called marks.
    fn card(&mut self, _numbers: &[u8], _marked: &[bool]) {}

    /// Whether the start control is available (host with enough players).
    fn start_enabled(&mut self, _enabled: bool) {}

    /// Whether the reset control is available (host, game finished).
    fn reset_enabled(&mut self, _enabled: bool) {}

    /// Whether the claim control is available (game running).
    fn claim_enabled(&mut self, _enabled: bool) {}
}

/// A presenter that renders nothing. Used by tests and headless peers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
