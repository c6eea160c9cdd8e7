//! ## natlabb-broker
//! Broker client, queue routing, and result delivery for the job layer.
//!
//! Jobs flow producer -> [`BrokerClient`] -> [`JobRouter`] (queue
//! assignment) -> worker consumption; finished traces come back through a
//! [`ResultChannel`] keyed by correlation id. Transport-level retry lives
//! here and is independent of the engine-level retry controller layered
//! above it.

mod client;
mod endpoint;
mod error;
mod job;
mod results;
mod router;
mod transport;

pub use client::{BrokerClient, SUBMIT_ATTEMPTS, SUBMIT_RETRY_DELAY};
pub use endpoint::pick_endpoint;
pub use error::TransportError;
pub use job::{CorrelationId, EmulationJob};
pub use results::{InMemoryResultStore, ResultChannel, StoredResult};
pub use router::JobRouter;
pub use transport::{BrokerTransport, InMemoryBroker};
