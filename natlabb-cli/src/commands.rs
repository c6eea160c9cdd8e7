use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use opentelemetry::KeyValue;
use tokio::time::sleep;
use tracing::{info, warn};

use natlabb_broker::{BrokerClient, EmulationJob, InMemoryBroker, InMemoryResultStore};
use natlabb_config::{EngineConfig, NatlabbConfig};
use natlabb_engine::{ReferenceEngine, RetryController};
use natlabb_telemetry::logging::EventLogger;
use natlabb_telemetry::metrics::MetricsRecorder;
use natlabb_topology::{codec, TopologyDocument};
use natlabb_worker::spawn_workers;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a topology file through the full job path in one process
    Emulate(EmulateArgs),
    /// Decode and validate a topology file without running it
    Validate(ValidateArgs),
    /// Fuzz the retry policy with randomized build-fault probabilities
    Fuzz(FuzzArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EmulateArgs {
    /// Topology JSON file to emulate
    #[arg(short, long)]
    pub file: PathBuf,
    /// Optional configuration file (defaults to the standard hierarchy)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Directory to write capture artifacts into
    #[arg(long, default_value = ".")]
    pub captures_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Topology JSON file to check
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct FuzzArgs {
    /// Initial seed for fuzzing (will auto-increment)
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Number of fuzzing iterations
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,
}

fn load_config(path: Option<&PathBuf>) -> Result<NatlabbConfig, natlabb_config::ConfigError> {
    match path {
        Some(path) => NatlabbConfig::load_from_path(path),
        None => NatlabbConfig::load(),
    }
}

pub async fn run_emulate(
    args: EmulateArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = load_config(args.config.as_ref())?;
    let raw = std::fs::read(&args.file)?;
    // Reject invalid documents up front. A worker consumes a rejected job
    // without delivering a result, so an unchecked submission would leave
    // the result poll below with nothing to wait for.
    codec::decode(&raw)?;

    let broker = Arc::new(InMemoryBroker::new());
    let store = Arc::new(InMemoryResultStore::new());
    let client = BrokerClient::new(
        broker.clone(),
        config.broker.exchange.clone(),
        config.broker.queues.clone(),
        config.broker.endpoints.clone(),
    )?;
    client
        .connect_with_retry(
            config.broker.connect_retry_on_startup,
            Duration::from_secs(config.broker.health_check_interval_secs),
        )
        .await?;

    let engine = Arc::new(ReferenceEngine::with_fault_probability(
        config.worker.engine.seed,
        config.worker.engine.fault_probability,
    ));
    let terminate = Arc::new(AtomicBool::new(false));
    // Cover every queue even when the configured concurrency is smaller
    // than the fleet; the routed queue must have a consumer.
    let concurrency = config.worker.concurrency.max(config.broker.queues.len());
    let handles = spawn_workers(
        engine,
        store.clone(),
        broker,
        &config.broker.queues,
        concurrency,
        metrics.clone(),
        terminate.clone(),
    );

    let job = EmulationJob::new(Bytes::from(raw));
    let correlation_id = job.id().clone();
    let queue = client.submit(job).await?;
    metrics
        .submit_retries
        .inc_by(client.submit_retry_count() as f64);
    info!(queue = %queue, correlation_id = %correlation_id, "Job submitted");

    let result = loop {
        if let Some(result) = store.take(&correlation_id) {
            break result;
        }
        sleep(Duration::from_millis(10)).await;
    };

    terminate.store(true, Ordering::SeqCst);
    for handle in handles {
        let _ = handle.await;
    }

    if result.trace == b"[]" && result.captures.is_empty() {
        warn!("Engine produced no trace (empty result placeholder)");
    }
    println!("{}", String::from_utf8_lossy(&result.trace));
    for capture in &result.captures {
        let path = args.captures_dir.join(&capture.name);
        std::fs::write(&path, &capture.data)?;
        info!(path = %path.display(), bytes = capture.data.len(), "Capture written");
    }

    EventLogger::log_event(
        "emulation_complete",
        vec![
            KeyValue::new("correlation_id", correlation_id.to_string()),
            KeyValue::new("captures", result.captures.len().to_string()),
        ],
    )
    .await;
    Ok(())
}

pub async fn run_validate(
    args: ValidateArgs,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let raw = std::fs::read(&args.file)?;
    let document: TopologyDocument = codec::decode(&raw)?;
    println!(
        "{}: {} nodes, {} edges, {} jobs",
        args.file.display(),
        document.nodes.len(),
        document.edges.len(),
        document.jobs.len()
    );
    Ok(())
}

pub async fn run_fuzz(
    args: FuzzArgs,
    metrics: MetricsRecorder,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let topology = fuzz_topology();
    let controller = RetryController::new();
    let mut degraded = 0usize;

    for i in 0..args.iterations {
        let engine_config = EngineConfig::generate_fuzz_config(args.seed + i as u64);
        let engine = ReferenceEngine::with_fault_probability(
            engine_config.seed,
            engine_config.fault_probability,
        );

        let (_, state) = controller.run(&engine, &topology);
        metrics.engine_attempts.observe(state.attempts as f64);
        metrics.inc_jobs();
        if state.degraded() {
            degraded += 1;
            metrics.job_failures.inc();
        }
    }

    info!(
        iterations = args.iterations,
        degraded,
        "Fuzzing complete: {} of {} runs degraded to the empty placeholder",
        degraded,
        args.iterations
    );
    EventLogger::log_event(
        "fuzz_complete",
        vec![
            KeyValue::new("iterations", args.iterations.to_string()),
            KeyValue::new("degraded", degraded.to_string()),
        ],
    )
    .await;
    Ok(())
}

fn fuzz_topology() -> TopologyDocument {
    codec::decode(
        serde_json::json!({
            "nodes": [{"id": "h1"}, {"id": "sw1", "device": "switch"}, {"id": "h2"}],
            "edges": [
                {"source": "h1", "target": "sw1"},
                {"source": "sw1", "target": "h2", "data": {"loss_percentage": 25}}
            ],
            "jobs": [{"node": "h1", "command": "ping", "args": ["-c", "1", "h2"]}]
        })
        .to_string()
        .as_bytes(),
    )
    .expect("built-in fuzz topology is well-formed")
}
