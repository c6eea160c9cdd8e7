//! ## natlabb-engine
//! Engine adapter seam and the bounded retry policy around it.
//!
//! The real emulation backend (namespace/veth manipulation, device
//! emulation) plugs in behind [`EmulationEngine`]; this crate only decides
//! *when* to call it again. A deterministic [`ReferenceEngine`] stands in
//! for tests, fuzzing, and the single-process CLI.

mod error;
mod reference;
mod retry;

pub use error::{EngineError, ErrorClass};
pub use reference::ReferenceEngine;
pub use retry::{RetryController, RetryState, MAX_ATTEMPTS};

use natlabb_topology::{EmulationResult, TopologyDocument};

/// Opaque call boundary to the simulation engine.
///
/// `run` is synchronous: one call emulates one topology end to end. The
/// adapter itself never retries; that is the [`RetryController`]'s job.
pub trait EmulationEngine: Send + Sync {
    fn run(&self, topology: &TopologyDocument) -> Result<EmulationResult, EngineError>;
}
