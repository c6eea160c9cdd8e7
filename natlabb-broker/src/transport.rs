//! Broker transport seam and the in-memory implementation.
//!
//! The trait is the boundary a real AMQP-style client would implement; the
//! in-memory broker backs tests and the single-process CLI. Declarations
//! are idempotent: redeclaring an existing exchange or queue is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::job::EmulationJob;

/// Connection lifecycle and wire operations against one broker.
pub trait BrokerTransport: Send + Sync {
    /// Establish (or re-establish) the connection to `endpoint`.
    fn connect(&self, endpoint: &str) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Declare the exchange. Idempotent.
    fn declare_exchange(&self, exchange: &str) -> Result<(), TransportError>;

    /// Declare a queue and bind it under the exchange. Idempotent.
    fn declare_queue(&self, exchange: &str, queue: &str) -> Result<(), TransportError>;

    /// Publish one job to a declared queue.
    fn publish(&self, queue: &str, job: EmulationJob) -> Result<(), TransportError>;

    /// Pull the next job off a declared queue, if any.
    fn consume(&self, queue: &str) -> Result<Option<EmulationJob>, TransportError>;
}

struct QueueChannel {
    sender: Sender<EmulationJob>,
    receiver: Receiver<EmulationJob>,
}

/// In-process broker: one unbounded channel per queue, exchange bindings
/// tracked for declaration idempotence. Fault-injection knobs let tests
/// exercise the transport retry paths.
#[derive(Default)]
pub struct InMemoryBroker {
    connected: AtomicBool,
    queues: Mutex<HashMap<String, QueueChannel>>,
    bindings: Mutex<HashMap<String, Vec<String>>>,
    connect_failures: AtomicU32,
    publish_failures: AtomicU32,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connection attempts fail, for startup-retry tests.
    pub fn inject_connect_failures(&self, n: u32) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` publishes fail, for submission-retry tests.
    pub fn inject_publish_failures(&self, n: u32) {
        self.publish_failures.store(n, Ordering::SeqCst);
    }

    /// Queues currently bound under an exchange.
    pub fn bound_queues(&self, exchange: &str) -> Vec<String> {
        self.bindings
            .lock()
            .get(exchange)
            .cloned()
            .unwrap_or_default()
    }

    fn consume_injected(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl BrokerTransport for InMemoryBroker {
    fn connect(&self, endpoint: &str) -> Result<(), TransportError> {
        if Self::consume_injected(&self.connect_failures) {
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::Unavailable(endpoint.to_string()));
        }
        debug!(endpoint, "In-memory broker connected");
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn declare_exchange(&self, exchange: &str) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.bindings.lock().entry(exchange.to_string()).or_default();
        Ok(())
    }

    fn declare_queue(&self, exchange: &str, queue: &str) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let mut queues = self.queues.lock();
        queues.entry(queue.to_string()).or_insert_with(|| {
            let (sender, receiver) = unbounded();
            QueueChannel { sender, receiver }
        });

        let mut bindings = self.bindings.lock();
        let bound = bindings.entry(exchange.to_string()).or_default();
        if !bound.iter().any(|q| q == queue) {
            bound.push(queue.to_string());
        }
        Ok(())
    }

    fn publish(&self, queue: &str, job: EmulationJob) -> Result<(), TransportError> {
        if Self::consume_injected(&self.publish_failures) {
            return Err(TransportError::ConnectionLost("publish dropped".into()));
        }
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let queues = self.queues.lock();
        let channel = queues
            .get(queue)
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?;
        channel
            .sender
            .send(job)
            .map_err(|e| TransportError::ConnectionLost(e.to_string()))
    }

    fn consume(&self, queue: &str) -> Result<Option<EmulationJob>, TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let queues = self.queues.lock();
        let channel = queues
            .get(queue)
            .ok_or_else(|| TransportError::UnknownQueue(queue.to_string()))?;
        match channel.receiver.try_recv() {
            Ok(job) => Ok(Some(job)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(TransportError::ConnectionLost("queue closed".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn job() -> EmulationJob {
        EmulationJob::new(Bytes::from_static(b"{}"))
    }

    fn connected_broker() -> InMemoryBroker {
        let broker = InMemoryBroker::new();
        broker.connect("localhost:5672").unwrap();
        broker
    }

    #[test]
    fn declaration_is_idempotent() {
        let broker = connected_broker();
        broker.declare_exchange("jobs").unwrap();
        broker.declare_queue("jobs", "q0").unwrap();
        broker.declare_queue("jobs", "q0").unwrap();
        assert_eq!(broker.bound_queues("jobs"), vec!["q0".to_string()]);
    }

    #[test]
    fn publish_and_consume_round_trip() {
        let broker = connected_broker();
        broker.declare_exchange("jobs").unwrap();
        broker.declare_queue("jobs", "q0").unwrap();

        let submitted = job();
        broker.publish("q0", submitted.clone()).unwrap();
        let consumed = broker.consume("q0").unwrap().unwrap();
        assert_eq!(consumed.id(), submitted.id());
        assert!(broker.consume("q0").unwrap().is_none());
    }

    #[test]
    fn publish_to_undeclared_queue_fails() {
        let broker = connected_broker();
        assert!(matches!(
            broker.publish("ghost", job()),
            Err(TransportError::UnknownQueue(_))
        ));
    }

    #[test]
    fn operations_require_connection() {
        let broker = InMemoryBroker::new();
        assert!(matches!(
            broker.declare_exchange("jobs"),
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn injected_connect_failures_expire() {
        let broker = InMemoryBroker::new();
        broker.inject_connect_failures(2);
        assert!(broker.connect("b").is_err());
        assert!(broker.connect("b").is_err());
        assert!(broker.connect("b").is_ok());
    }
}
