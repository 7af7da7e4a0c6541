//! Error types for the bus layer.

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The room channel has shut down — no subscribers can be reached.
    #[error("room channel closed")]
    Closed,
}
