//! Transport-level error conditions.
//!
//! Unlike engine errors, transport errors are never silently swallowed:
//! submission exhaustion surfaces to the submitter.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Broker unavailable at {0}")]
    Unavailable(String),

    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Not connected to any broker endpoint")]
    NotConnected,

    #[error("Unknown queue '{0}'")]
    UnknownQueue(String),

    #[error("Queue fleet is empty")]
    NoQueues,

    #[error("No broker endpoints configured")]
    NoEndpoints,

    #[error("Submission failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    #[error("Result delivery failed for {correlation_id}: {reason}")]
    Delivery {
        correlation_id: String,
        reason: String,
    },
}
