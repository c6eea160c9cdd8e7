//! Engine error classification.

use thiserror::Error;

/// Errors raised by an [`EmulationEngine`](crate::EmulationEngine) call.
///
/// The classification drives the retry policy: recoverable input errors are
/// assumed transient noise in the engine's build step and consume an
/// attempt; everything else is assumed deterministic and aborts the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The topology was schema-valid but could not be realized by the
    /// engine (an inconsistency only detectable at build time).
    #[error("Topology could not be realized: {0}")]
    RecoverableInput(String),

    /// Engine crash, resource exhaustion, or unexpected internal state.
    #[error("Engine failure: {0}")]
    Fatal(String),
}

/// Error class without the message, kept in [`RetryState`](crate::RetryState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RecoverableInput,
    Fatal,
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::RecoverableInput(_) => ErrorClass::RecoverableInput,
            EngineError::Fatal(_) => ErrorClass::Fatal,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.class() == ErrorClass::RecoverableInput
    }
}
