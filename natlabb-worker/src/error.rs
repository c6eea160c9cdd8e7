//! Worker-side error type.

use thiserror::Error;

use natlabb_broker::TransportError;
use natlabb_topology::ValidationError;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The payload never reached the engine; decode failures are not
    /// retried.
    #[error("Topology rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Consuming or delivering failed. Reported, not retried.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
