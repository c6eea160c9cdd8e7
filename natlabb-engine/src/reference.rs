//! Deterministic reference engine.
//!
//! Stands in for the real emulation backend in tests, fuzz runs, and the
//! single-process CLI. Trace generation is a pure function of the topology
//! and the seed; the optional build-fault injection is the only source of
//! nondeterminism and models the probabilistic step that makes recoverable
//! errors worth retrying.

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use natlabb_topology::{
    CaptureArtifact, EmulationResult, Edge, JobSpec, PacketConfig, PacketEvent, TopologyDocument,
};

use crate::error::EngineError;
use crate::EmulationEngine;

pub struct ReferenceEngine {
    seed: u64,
    fault_probability: f64,
    fault_rng: Mutex<SmallRng>,
}

impl ReferenceEngine {
    pub fn new(seed: u64) -> Self {
        Self::with_fault_probability(seed, 0.0)
    }

    /// Inject a recoverable build fault with the given probability on each
    /// run. Probabilities are clamped to `0.0..=1.0`.
    pub fn with_fault_probability(seed: u64, fault_probability: f64) -> Self {
        Self {
            seed,
            fault_probability: fault_probability.clamp(0.0, 1.0),
            fault_rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    /// One time step: the packets one job invocation puts on one link.
    ///
    /// Two base events (request and reply); loss removes
    /// `floor(n * loss / 100)` events, duplication appends
    /// `ceil(n * dup / 100)` extra copies of the request, so any non-zero
    /// duplicate percentage strictly increases the event count.
    fn link_step(job: &JobSpec, edge: &Edge) -> Vec<PacketEvent> {
        let config = PacketConfig {
            duplicate_percentage: edge.data.duplicate_percentage,
            loss_percentage: edge.data.loss_percentage,
        };

        let base = vec![
            PacketEvent {
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: format!("{} request", job.command),
                config,
            },
            PacketEvent {
                source: edge.target.clone(),
                target: edge.source.clone(),
                label: format!("{} reply", job.command),
                config,
            },
        ];

        let dropped = (base.len() as f64 * config.loss_percentage / 100.0).floor() as usize;
        let duplicated = if config.duplicate_percentage > 0.0 {
            (base.len() as f64 * config.duplicate_percentage / 100.0).ceil() as usize
        } else {
            0
        };

        let mut group: Vec<PacketEvent> = base
            .iter()
            .take(base.len().saturating_sub(dropped))
            .cloned()
            .collect();
        for _ in 0..duplicated {
            let mut dup = base[0].clone();
            dup.label = format!("{} request (duplicate)", job.command);
            group.push(dup);
        }
        group
    }
}

impl EmulationEngine for ReferenceEngine {
    fn run(&self, topology: &TopologyDocument) -> Result<EmulationResult, EngineError> {
        if self.fault_probability > 0.0
            && self.fault_rng.lock().random_bool(self.fault_probability)
        {
            return Err(EngineError::RecoverableInput(
                "virtual link setup raced during topology build".into(),
            ));
        }

        // Build-time consistency check: job targets must exist as devices.
        // The codec does not validate this, so it surfaces here.
        for job in &topology.jobs {
            if topology.node(&job.node).is_none() {
                return Err(EngineError::RecoverableInput(format!(
                    "job command targets missing device '{}'",
                    job.node
                )));
            }
        }

        let mut groups = Vec::new();
        let mut captures = Vec::new();

        for job in &topology.jobs {
            let args = job.filtered_args();
            let mut log = format!(
                "# natlabb reference engine seed={}\n# {} {} @ {}\n",
                self.seed,
                job.command,
                args.join(" "),
                job.node
            );

            for edge in &topology.edges {
                let group = Self::link_step(job, edge);
                trace!(
                    job = %job.node,
                    edge = %format!("{}->{}", edge.source, edge.target),
                    events = group.len(),
                    "Generated link step"
                );
                for event in &group {
                    log.push_str(&format!(
                        "{} > {}: {}\n",
                        event.source, event.target, event.label
                    ));
                }
                groups.push(group);
            }

            captures.push(CaptureArtifact {
                name: format!("{}_{}.pcap", job.node, job.command),
                data: log.into_bytes(),
            });
        }

        Ok(EmulationResult { groups, captures })
    }
}
