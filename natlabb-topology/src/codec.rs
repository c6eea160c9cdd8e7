//! JSON codec for topology documents and emulation traces.

use crate::document::TopologyDocument;
use crate::error::ValidationError;
use crate::trace::EmulationResult;

/// Decode and validate a wire-format topology document.
///
/// Fails on non-JSON payloads and on schema violations; percentages absent
/// from old-format documents decode to zero.
pub fn decode(raw: &[u8]) -> Result<TopologyDocument, ValidationError> {
    let document: TopologyDocument = serde_json::from_slice(raw)?;
    document.validate()?;
    Ok(document)
}

/// Encode an emulation trace as the wire-format event-group array.
///
/// Total: the trace model contains nothing that can fail to serialize.
/// Capture artifacts travel out of band and are not part of the JSON.
pub fn encode(result: &EmulationResult) -> Vec<u8> {
    serde_json::to_vec(&result.groups).expect("event trace serialization is infallible")
}
