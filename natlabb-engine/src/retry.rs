//! Bounded, error-class-aware retry loop around the engine call.

use tracing::{debug, error, warn};

use natlabb_topology::{EmulationResult, TopologyDocument};

use crate::error::ErrorClass;
use crate::EmulationEngine;

/// Attempt budget per job.
pub const MAX_ATTEMPTS: u32 = 3;

/// Per-execution retry bookkeeping. Lives for one worker's processing of
/// one delivery; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempts: u32,
    pub last_error: Option<ErrorClass>,
}

impl RetryState {
    /// True when the loop ended without a successful engine run.
    pub fn degraded(&self) -> bool {
        self.last_error.is_some()
    }
}

/// Drives at most [`MAX_ATTEMPTS`] engine calls per job.
///
/// Recoverable input errors consume an attempt and retry; fatal errors
/// abort immediately; success stops the loop. On exhaustion or abort the
/// controller returns the last-assigned result, which is the empty
/// placeholder when no attempt succeeded. That swallow-and-return-empty
/// behavior is the existing contract: callers distinguish failure from a
/// legitimately empty simulation only by the emptiness convention.
#[derive(Debug, Clone, Copy)]
pub struct RetryController {
    max_attempts: u32,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryController {
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    fn with_budget(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn run<E: EmulationEngine + ?Sized>(
        &self,
        engine: &E,
        topology: &TopologyDocument,
    ) -> (EmulationResult, RetryState) {
        let mut state = RetryState::default();
        let mut result = EmulationResult::empty();

        while state.attempts < self.max_attempts {
            state.attempts += 1;
            match engine.run(topology) {
                Ok(trace) => {
                    debug!(attempts = state.attempts, "Engine run succeeded");
                    result = trace;
                    state.last_error = None;
                    break;
                }
                Err(err) => {
                    state.last_error = Some(err.class());
                    match err.class() {
                        ErrorClass::RecoverableInput => {
                            warn!(
                                attempt = state.attempts,
                                "Recoverable engine error, retrying: {err}"
                            );
                            continue;
                        }
                        ErrorClass::Fatal => {
                            error!(attempt = state.attempts, "Fatal engine error: {err}");
                            break;
                        }
                    }
                }
            }
        }

        (result, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use natlabb_topology::{PacketConfig, PacketEvent};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn empty_doc() -> TopologyDocument {
        serde_json::from_str(r#"{"nodes": [], "edges": []}"#).unwrap()
    }

    fn one_event_result() -> EmulationResult {
        EmulationResult {
            groups: vec![vec![PacketEvent {
                source: "a".into(),
                target: "b".into(),
                label: "probe".into(),
                config: PacketConfig::default(),
            }]],
            captures: vec![],
        }
    }

    /// Fails with the given error a fixed number of times, then succeeds.
    struct FlakyEngine {
        calls: AtomicU32,
        failures: u32,
        error: EngineError,
    }

    impl FlakyEngine {
        fn new(failures: u32, error: EngineError) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                error,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EmulationEngine for FlakyEngine {
        fn run(&self, _topology: &TopologyDocument) -> Result<EmulationResult, EngineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(one_event_result())
            }
        }
    }

    #[test]
    fn succeeds_on_third_attempt_after_two_recoverable_errors() {
        let engine = FlakyEngine::new(2, EngineError::RecoverableInput("race".into()));
        let (result, state) = RetryController::new().run(&engine, &empty_doc());
        assert_eq!(engine.calls(), 3);
        assert_eq!(state.attempts, 3);
        assert!(!state.degraded());
        assert_eq!(result.event_count(), 1);
    }

    #[test]
    fn exhaustion_returns_empty_placeholder_after_three_attempts() {
        let engine = FlakyEngine::new(u32::MAX, EngineError::RecoverableInput("race".into()));
        let (result, state) = RetryController::new().run(&engine, &empty_doc());
        assert_eq!(engine.calls(), 3);
        assert_eq!(state.attempts, 3);
        assert_eq!(state.last_error, Some(ErrorClass::RecoverableInput));
        assert!(result.is_empty());
    }

    #[test]
    fn fatal_error_aborts_after_one_attempt() {
        let engine = FlakyEngine::new(u32::MAX, EngineError::Fatal("oom".into()));
        let (result, state) = RetryController::new().run(&engine, &empty_doc());
        assert_eq!(engine.calls(), 1);
        assert_eq!(state.attempts, 1);
        assert_eq!(state.last_error, Some(ErrorClass::Fatal));
        assert!(result.is_empty());
    }

    #[test]
    fn first_attempt_success_consumes_one_attempt() {
        let engine = FlakyEngine::new(0, EngineError::Fatal("unused".into()));
        let (_, state) = RetryController::new().run(&engine, &empty_doc());
        assert_eq!(state.attempts, 1);
        assert!(!state.degraded());
    }

    #[test]
    fn budget_is_configurable_for_tests() {
        let engine = FlakyEngine::new(u32::MAX, EngineError::RecoverableInput("race".into()));
        let (_, state) = RetryController::with_budget(5).run(&engine, &empty_doc());
        assert_eq!(state.attempts, 5);
    }
}
