//! Observability configuration.
//!
//! Placeholders for metrics and tracing parameters; the scrape and log
//! transport surfaces live outside this core.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MetricsConfig {}

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TracingConfig {}

/// Telemetry configuration.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// Metrics collection parameters.
    #[validate(nested)]
    pub metrics: MetricsConfig,

    /// Distributed tracing parameters.
    #[validate(nested)]
    pub tracing: TracingConfig,
}
