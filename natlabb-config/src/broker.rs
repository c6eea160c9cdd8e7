//! Broker connection and queue-fleet configuration.
//!
//! Everything the job layer needs to reach the message broker: endpoint
//! candidates for failover, the exchange and its queue fleet, and the
//! startup connection policy.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Message-broker configuration surface.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct BrokerConfig {
    /// Candidate broker endpoints (`host` or `host:port`); failover picks
    /// uniformly among them.
    #[serde(default = "default_endpoints")]
    #[validate(custom(function = validation::validate_endpoint_list))]
    pub endpoints: Vec<String>,

    /// Result-store endpoint the workers deliver to.
    #[serde(default = "default_result_store")]
    pub result_store: String,

    /// Exchange all job queues are bound under.
    #[serde(default = "default_exchange")]
    #[validate(custom(function = validation::validate_broker_name))]
    pub exchange: String,

    /// Queue fleet bound to the exchange at startup.
    #[serde(default = "default_queues")]
    #[validate(custom(function = validation::validate_queue_list))]
    pub queues: Vec<String>,

    /// Spacing between connection probes (seconds).
    #[serde(default = "default_health_interval")]
    #[validate(range(min = 1, max = 3600))]
    pub health_check_interval_secs: u64,

    /// Keep probing instead of failing the process when the broker is
    /// unavailable at startup.
    #[serde(default = "default_true")]
    pub connect_retry_on_startup: bool,
}

fn default_endpoints() -> Vec<String> {
    vec!["localhost:5672".into()]
}

fn default_result_store() -> String {
    "localhost:6379".into()
}

fn default_exchange() -> String {
    "natlabb.jobs".into()
}

fn default_queues() -> Vec<String> {
    (0..4).map(|i| format!("emulation-{}", i)).collect()
}

fn default_health_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            result_store: default_result_store(),
            exchange: default_exchange(),
            queues: default_queues(),
            health_check_interval_secs: default_health_interval(),
            connect_retry_on_startup: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        BrokerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_queue_fleet() {
        let config = BrokerConfig {
            queues: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
