//! ## natlabb-telemetry
//! **Observability for the emulation-job layer**
//!
//! ### Components:
//! - `metrics/`: Prometheus registry with job counters and attempt histograms
//! - `logging/`: structured logging with `tracing` and OpenTelemetry metadata

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
