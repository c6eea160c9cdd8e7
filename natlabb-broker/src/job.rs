//! The immutable submission unit.

use bytes::Bytes;
use rand::RngCore;

/// Correlates a job with its eventual result across process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Generate a fresh 16-byte random identifier.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One emulation job: the serialized topology document plus its correlation
/// identifier. Created by the producer, consumed once per delivery attempt
/// by a worker, never mutated after creation.
#[derive(Debug, Clone)]
pub struct EmulationJob {
    id: CorrelationId,
    payload: Bytes,
}

impl EmulationJob {
    pub fn new(payload: Bytes) -> Self {
        Self {
            id: CorrelationId::generate(),
            payload,
        }
    }

    pub fn with_id(id: CorrelationId, payload: Bytes) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
    }

    #[test]
    fn id_is_32_hex_chars() {
        let id = CorrelationId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
