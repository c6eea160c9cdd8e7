//! ## natlabb-topology
//! Wire-format topology documents and the packet-event trace model.
//!
//! The codec is the first seam of the job layer: raw JSON comes off the
//! queue, is validated into a [`TopologyDocument`], and the engine's
//! [`EmulationResult`] is serialized back out. Malformed input surfaces as
//! [`ValidationError`] and is never retried.

pub mod codec;
mod document;
mod error;
mod trace;

pub use codec::{decode, encode};
pub use document::{
    DeviceKind, Edge, Interface, JobSpec, LinkData, Node, TopologyDocument, VlanTagging,
};
pub use error::ValidationError;
pub use trace::{CaptureArtifact, EmulationResult, EventGroup, PacketConfig, PacketEvent};
