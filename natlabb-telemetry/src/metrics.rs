//! ## natlabb-telemetry::metrics
//! **Prometheus registry for the job execution layer**
//!
//! Counters track job throughput and failure modes; the attempts histogram
//! exposes how often the retry budget is actually consumed.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub jobs_total: prometheus::Counter,
    pub job_failures: prometheus::Counter,
    pub submit_retries: prometheus::Counter,
    pub engine_attempts: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let jobs_total =
            Counter::new("natlabb_jobs_total", "Total emulation jobs processed").unwrap();

        let job_failures = Counter::new(
            "natlabb_job_failures_total",
            "Jobs that degraded to the empty-result placeholder",
        )
        .unwrap();

        let submit_retries = Counter::new(
            "natlabb_submit_retries_total",
            "Transport-level submission retries",
        )
        .unwrap();

        let engine_attempts = Histogram::with_opts(
            HistogramOpts::new(
                "natlabb_engine_attempts",
                "Engine attempts consumed per job",
            )
            .buckets(vec![1.0, 2.0, 3.0]),
        )
        .unwrap();

        registry.register(Box::new(jobs_total.clone())).unwrap();
        registry.register(Box::new(job_failures.clone())).unwrap();
        registry.register(Box::new(submit_retries.clone())).unwrap();
        registry
            .register(Box::new(engine_attempts.clone()))
            .unwrap();

        Self {
            registry,
            jobs_total,
            job_failures,
            submit_retries,
            engine_attempts,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn inc_jobs(&self) {
        self.jobs_total.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_and_gathers() {
        let metrics = MetricsRecorder::new();
        metrics.inc_jobs();
        metrics.engine_attempts.observe(3.0);
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("natlabb_jobs_total"));
        assert!(text.contains("natlabb_engine_attempts"));
    }
}
