//! Deterministic queue assignment via rendezvous hashing.
//!
//! Highest-random-weight hashing keyed with blake3: each (queue, routing
//! key) pair gets a weight, the queue with the highest weight wins. Removing
//! a queue remaps only the keys it previously won; adding one steals only
//! the keys it now wins. The router is a pure mapping and holds no per-job
//! state.

use crate::error::TransportError;

pub struct JobRouter {
    queues: Vec<String>,
}

impl JobRouter {
    /// Build a router over the queue fleet. The fleet must be non-empty.
    pub fn new(queues: Vec<String>) -> Result<Self, TransportError> {
        if queues.is_empty() {
            return Err(TransportError::NoQueues);
        }
        Ok(Self { queues })
    }

    pub fn queues(&self) -> &[String] {
        &self.queues
    }

    /// Assign a routing key to exactly one queue.
    pub fn route(&self, routing_key: &str) -> &str {
        self.queues
            .iter()
            .max_by(|a, b| {
                weight(a, routing_key)
                    .cmp(&weight(b, routing_key))
                    .then_with(|| a.cmp(b))
            })
            .map(String::as_str)
            .expect("router is never constructed with an empty queue fleet")
    }
}

/// Per-(queue, key) weight. The 0xff separator keeps `("ab", "c")` and
/// `("a", "bc")` from colliding.
fn weight(queue: &str, routing_key: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(queue.as_bytes());
    hasher.update(&[0xff]);
    hasher.update(routing_key.as_bytes());
    let digest = hasher.finalize();
    u64::from_le_bytes(digest.as_bytes()[..8].try_into().expect("digest is 32 bytes"))
}
