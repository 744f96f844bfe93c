//! Error taxonomy for the forecast engine.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("invalid simulation request: {0}")]
    InvalidRequest(String),

    /// The global concurrent-run cap is hit. Requests are rejected, not
    /// queued; the caller should retry later.
    #[error("too many concurrent simulation runs ({running} running, cap {cap}); try again later")]
    CapacityExceeded { running: usize, cap: usize },

    #[error("simulation run {0} not found")]
    RunNotFound(Uuid),

    #[error("simulation run {id} is already {status}")]
    AlreadyTerminal { id: Uuid, status: String },

    #[error("simulation cancelled")]
    Cancelled,

    #[error("simulation failed: {0}")]
    Internal(String),
}
