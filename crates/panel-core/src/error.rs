//! Error types for the panel engine

use thiserror::Error;

/// Errors surfaced by the engine and its queues
///
/// Resource exhaustion is an explicit failure result to the immediate
/// caller; the system keeps running in degraded mode. Nothing here is ever
/// allowed to take the decode worker down.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Outbound queue stayed full past the bounded enqueue wait
    #[error("outbound queue full")]
    QueueFull,

    /// Outbound command rejected before queuing
    #[error("protocol error: {0}")]
    Protocol(#[from] cat_ts590::ParseError),

    /// Relay id outside 1..=8
    #[error("invalid relay id: {0}")]
    InvalidRelay(u8),

    /// Antenna-name blob did not deserialize
    #[error("bad antenna name blob: {0}")]
    BadNameBlob(#[from] serde_json::Error),

    /// I/O error from the transport or name store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
