//! Result channel: trace and capture delivery keyed by correlation id.
//!
//! No retry logic lives here. Delivery failures are reported, not retried;
//! the out-of-scope polling surface attaches at this boundary.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use natlabb_topology::CaptureArtifact;

use crate::error::TransportError;
use crate::job::CorrelationId;

/// Carries one finished job's output back to whoever submitted it.
pub trait ResultChannel: Send + Sync {
    fn deliver(
        &self,
        correlation_id: &CorrelationId,
        encoded_trace: Vec<u8>,
        captures: Vec<CaptureArtifact>,
    ) -> Result<(), TransportError>;
}

/// One delivered result: the encoded event-group array plus captures.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub trace: Vec<u8>,
    pub captures: Vec<CaptureArtifact>,
}

/// In-process result store for tests and the single-process CLI.
#[derive(Default)]
pub struct InMemoryResultStore {
    results: Mutex<HashMap<CorrelationId, StoredResult>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the result for a correlation id, if delivered.
    pub fn take(&self, correlation_id: &CorrelationId) -> Option<StoredResult> {
        self.results.lock().remove(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.results.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.lock().is_empty()
    }
}

impl ResultChannel for InMemoryResultStore {
    fn deliver(
        &self,
        correlation_id: &CorrelationId,
        encoded_trace: Vec<u8>,
        captures: Vec<CaptureArtifact>,
    ) -> Result<(), TransportError> {
        debug!(
            correlation_id = %correlation_id,
            trace_bytes = encoded_trace.len(),
            captures = captures.len(),
            "Result delivered"
        );
        self.results.lock().insert(
            correlation_id.clone(),
            StoredResult {
                trace: encoded_trace,
                captures,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_results_are_retrievable_once() {
        let store = InMemoryResultStore::new();
        let id = CorrelationId::generate();
        store.deliver(&id, b"[]".to_vec(), vec![]).unwrap();

        let result = store.take(&id).unwrap();
        assert_eq!(result.trace, b"[]");
        assert!(store.take(&id).is_none());
    }

    #[test]
    fn unknown_id_yields_nothing() {
        let store = InMemoryResultStore::new();
        assert!(store.take(&CorrelationId::generate()).is_none());
    }
}
