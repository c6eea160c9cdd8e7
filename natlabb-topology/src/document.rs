//! Wire-format topology document model.
//!
//! Mirrors the JSON the web frontend produces: ordered node, edge, and job
//! lists. Old documents may omit the link-quality percentages entirely and
//! may encode them as strings; both decode to the same in-memory shape.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// A complete network description as submitted by the producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

impl TopologyDocument {
    /// Check the document invariants: unique node ids, no dangling edge
    /// references, percentages within `0..=100`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(ValidationError::DuplicateNode(node.id.clone()));
            }
        }

        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(ValidationError::DanglingEdge {
                        from: edge.source.clone(),
                        target: edge.target.clone(),
                        missing: endpoint.clone(),
                    });
                }
            }
            edge.data.validate(&edge.source, &edge.target)?;
        }
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A single emulated device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub device: DeviceKind,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    /// Optional VLAN tagging: a single id or a list of ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan: Option<VlanTagging>,
}

/// Device kind determining emulation behavior (out of scope here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Host,
    Switch,
    Router,
    Generic,
}

/// A named interface on a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// VLAN tagging on a node: either one access VLAN or a trunk list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VlanTagging {
    Single(u16),
    Tagged(Vec<u16>),
}

/// A link between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub data: LinkData,
}

/// Link parameters. Percentages default to zero when an old-format document
/// omits them, and accept both JSON numbers and strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub duplicate_percentage: f64,
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub loss_percentage: f64,
}

impl LinkData {
    fn validate(&self, source: &str, target: &str) -> Result<(), ValidationError> {
        for (field, value) in [
            ("duplicate_percentage", self.duplicate_percentage),
            ("loss_percentage", self.loss_percentage),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PercentageOutOfRange {
                    field,
                    from: source.to_string(),
                    target: target.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// A per-node command invocation carried with the topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Node the command runs on.
    pub node: String,
    /// Command name (e.g. `ping`).
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Option flags allowed through per command; flags marked `true` consume a
/// value argument.
const PING_OPTIONS: &[(&str, bool)] = &[
    ("-c", true),
    ("-i", true),
    ("-s", true),
    ("-W", true),
    ("-q", false),
];

impl JobSpec {
    /// Filter the argument list against the command's option allowlist.
    ///
    /// Unknown flags are dropped together with their value argument; bare
    /// arguments (e.g. the ping destination) pass through.
    pub fn filtered_args(&self) -> Vec<String> {
        let allowed: &[(&str, bool)] = match self.command.as_str() {
            "ping" => PING_OPTIONS,
            _ => &[],
        };

        let mut kept = Vec::with_capacity(self.args.len());
        let mut iter = self.args.iter().peekable();
        while let Some(arg) = iter.next() {
            if !arg.starts_with('-') {
                kept.push(arg.clone());
                continue;
            }
            match allowed.iter().find(|(flag, _)| flag == arg) {
                Some((_, takes_value)) => {
                    kept.push(arg.clone());
                    if *takes_value {
                        if let Some(value) = iter.next() {
                            kept.push(value.clone());
                        }
                    }
                }
                None => {
                    // Drop the flag; swallow its value if one follows.
                    if let Some(next) = iter.peek() {
                        if !next.starts_with('-') {
                            iter.next();
                        }
                    }
                }
            }
        }
        kept
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PercentValue {
    Num(f64),
    Str(String),
}

/// Accept percentages as numbers (`5`) or strings (`"5"`).
fn deserialize_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match PercentValue::deserialize(deserializer)? {
        PercentValue::Num(n) => Ok(n),
        PercentValue::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid percentage '{}'", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_doc() -> TopologyDocument {
        serde_json::from_value(serde_json::json!({
            "nodes": [{"id": "h1"}, {"id": "h2"}],
            "edges": [{"source": "h1", "target": "h2"}]
        }))
        .unwrap()
    }

    #[test]
    fn validates_well_formed_document() {
        two_node_doc().validate().unwrap();
    }

    #[test]
    fn rejects_dangling_edge() {
        let doc: TopologyDocument = serde_json::from_value(serde_json::json!({
            "nodes": [{"id": "h1"}],
            "edges": [{"source": "h1", "target": "ghost"}]
        }))
        .unwrap();
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::DanglingEdge { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let doc: TopologyDocument = serde_json::from_value(serde_json::json!({
            "nodes": [{"id": "h1"}, {"id": "h1"}],
            "edges": []
        }))
        .unwrap();
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::DuplicateNode(_))
        ));
    }

    #[test]
    fn percentage_accepts_number_or_string() {
        let data: LinkData =
            serde_json::from_str(r#"{"duplicate_percentage": 5, "loss_percentage": "7.5"}"#)
                .unwrap();
        assert_eq!(data.duplicate_percentage, 5.0);
        assert_eq!(data.loss_percentage, 7.5);
    }

    #[test]
    fn percentage_defaults_to_zero() {
        let data: LinkData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.duplicate_percentage, 0.0);
        assert_eq!(data.loss_percentage, 0.0);
    }

    #[test]
    fn rejects_out_of_range_percentage() {
        let doc: TopologyDocument = serde_json::from_value(serde_json::json!({
            "nodes": [{"id": "h1"}, {"id": "h2"}],
            "edges": [{
                "source": "h1",
                "target": "h2",
                "data": {"loss_percentage": 140}
            }]
        }))
        .unwrap();
        assert!(matches!(
            doc.validate(),
            Err(ValidationError::PercentageOutOfRange { .. })
        ));
    }

    #[test]
    fn vlan_accepts_single_or_list() {
        let single: Node = serde_json::from_value(serde_json::json!({
            "id": "sw1", "device": "switch", "vlan": 10
        }))
        .unwrap();
        assert_eq!(single.vlan, Some(VlanTagging::Single(10)));

        let tagged: Node = serde_json::from_value(serde_json::json!({
            "id": "sw2", "device": "switch", "vlan": [10, 20]
        }))
        .unwrap();
        assert_eq!(tagged.vlan, Some(VlanTagging::Tagged(vec![10, 20])));
    }

    #[test]
    fn filters_unknown_ping_options() {
        let job = JobSpec {
            node: "h1".into(),
            command: "ping".into(),
            args: vec![
                "-c".into(),
                "3".into(),
                "--badflag".into(),
                "value".into(),
                "-q".into(),
                "10.0.0.2".into(),
            ],
        };
        assert_eq!(
            job.filtered_args(),
            vec!["-c", "3", "-q", "10.0.0.2"]
        );
    }

    #[test]
    fn unknown_command_keeps_only_bare_args() {
        let job = JobSpec {
            node: "h1".into(),
            command: "traceroute".into(),
            args: vec!["-m".into(), "5".into(), "10.0.0.2".into()],
        };
        assert_eq!(job.filtered_args(), vec!["10.0.0.2"]);
    }
}
