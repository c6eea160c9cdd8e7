//! Packet-event trace and capture-artifact model.
//!
//! The trace is the terminal output of one emulation job: an ordered list of
//! event groups (one group per logical time step), each an ordered list of
//! packet events. Every event carries both link-quality keys in its `config`
//! record even when the source topology predates them.

use serde::{Deserialize, Serialize};

/// One logical time step of the trace.
pub type EventGroup = Vec<PacketEvent>;

/// Link-quality settings in effect for one packet event.
///
/// Both keys are always serialized; older topology documents that omit the
/// percentages still produce `0.0` here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacketConfig {
    pub duplicate_percentage: f64,
    pub loss_percentage: f64,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            duplicate_percentage: 0.0,
            loss_percentage: 0.0,
        }
    }
}

/// A single packet observation in the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketEvent {
    /// Emitting node id.
    pub source: String,
    /// Receiving node id.
    pub target: String,
    /// Short description of the packet (command name, direction).
    pub label: String,
    pub config: PacketConfig,
}

/// A named binary blob produced alongside the trace (e.g. a packet capture).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureArtifact {
    pub name: String,
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// The terminal, owned output of one successful engine run.
///
/// `EmulationResult::empty()` doubles as the degraded placeholder the retry
/// controller hands back when the engine never produced a result; callers
/// can only tell the two apart by the emptiness convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmulationResult {
    pub groups: Vec<EventGroup>,
    pub captures: Vec<CaptureArtifact>,
}

impl EmulationResult {
    /// The distinguished placeholder: no trace, no captures.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.captures.is_empty()
    }

    /// Total packet events across all groups.
    pub fn event_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_placeholder_is_empty() {
        let result = EmulationResult::empty();
        assert!(result.is_empty());
        assert_eq!(result.event_count(), 0);
    }

    #[test]
    fn config_serializes_both_keys() {
        let value = serde_json::to_value(PacketConfig::default()).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("duplicate_percentage"));
        assert!(object.contains_key("loss_percentage"));
    }
}
