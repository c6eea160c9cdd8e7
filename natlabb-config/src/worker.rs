//! Worker and reference-engine configuration.

use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Worker pool configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct WorkerConfig {
    /// Number of worker tasks pulled up at startup. Each worker processes one
    /// job fully before taking the next.
    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 1024))]
    pub concurrency: usize,

    /// Reference-engine parameters.
    #[validate(nested)]
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            engine: EngineConfig::default(),
        }
    }
}

/// Reference-engine parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct EngineConfig {
    /// Seed for deterministic trace generation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Probability that a topology build fails with a recoverable error
    /// (0.0 to 1.0). Used for chaos and fuzz testing.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub fault_probability: f64,
}

fn default_seed() -> u64 {
    42
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            fault_probability: 0.0,
        }
    }
}

impl EngineConfig {
    /// Generate a randomized engine configuration for one fuzz iteration.
    pub fn generate_fuzz_config(seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Self {
            seed,
            fault_probability: rng.random_range(0.0..=0.9),
        }
    }
}
