//! Worker loop: consume, decode, execute under retry, encode, deliver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use natlabb_broker::{BrokerTransport, EmulationJob, ResultChannel};
use natlabb_engine::{EmulationEngine, RetryController, RetryState};
use natlabb_telemetry::{EventLogger, MetricsRecorder};
use natlabb_topology::{codec, EmulationResult};

use crate::error::WorkerError;

/// Processes jobs from one queue, one at a time.
pub struct Worker<E, C, T> {
    engine: Arc<E>,
    results: Arc<C>,
    transport: Arc<T>,
    queue: String,
    retry: RetryController,
    metrics: MetricsRecorder,
}

impl<E, C, T> Worker<E, C, T>
where
    E: EmulationEngine + 'static,
    C: ResultChannel + 'static,
    T: BrokerTransport + 'static,
{
    pub fn new(
        engine: Arc<E>,
        results: Arc<C>,
        transport: Arc<T>,
        queue: impl Into<String>,
        metrics: MetricsRecorder,
    ) -> Self {
        Self {
            engine,
            results,
            transport,
            queue: queue.into(),
            retry: RetryController::new(),
            metrics,
        }
    }

    /// Process one delivery end to end.
    ///
    /// Decode failures surface as [`WorkerError::Validation`] without an
    /// engine attempt. Engine failures never surface here: the retry
    /// controller degrades them to the empty placeholder, which is encoded
    /// and delivered like any real result.
    #[instrument(skip_all, fields(correlation_id = %job.id(), queue = %self.queue))]
    pub fn process_delivery(&self, job: &EmulationJob) -> Result<RetryState, WorkerError> {
        let document = codec::decode(job.payload())?;
        debug!(
            nodes = document.nodes.len(),
            edges = document.edges.len(),
            jobs = document.jobs.len(),
            "Topology decoded"
        );

        let (result, state) = self.retry.run(&*self.engine, &document);
        self.metrics.engine_attempts.observe(state.attempts as f64);
        if state.degraded() {
            self.metrics.job_failures.inc();
            warn!(
                attempts = state.attempts,
                "Engine produced no result, delivering empty placeholder"
            );
        }

        let encoded = codec::encode(&result);
        let EmulationResult { captures, .. } = result;
        self.results.deliver(job.id(), encoded, captures)?;
        self.metrics.inc_jobs();
        Ok(state)
    }

    /// Consume and process the next job, if one is queued.
    ///
    /// Returns `Ok(false)` when the queue was empty. Job-level failures
    /// (rejected topology, failed delivery) are reported and consume the
    /// delivery; they do not stop the worker.
    pub async fn process_next(&self) -> Result<bool, WorkerError> {
        let Some(job) = self.transport.consume(&self.queue)? else {
            return Ok(false);
        };

        match self.process_delivery(&job) {
            Ok(state) if state.degraded() => {
                EventLogger::log_event(
                    "job_degraded",
                    vec![
                        KeyValue::new("correlation_id", job.id().to_string()),
                        KeyValue::new("attempts", state.attempts.to_string()),
                    ],
                )
                .await;
            }
            Ok(_) => {}
            Err(WorkerError::Validation(err)) => {
                self.metrics.job_failures.inc();
                error!("Rejected topology document: {err}");
                EventLogger::log_event(
                    "job_rejected",
                    vec![
                        KeyValue::new("correlation_id", job.id().to_string()),
                        KeyValue::new("reason", err.to_string()),
                    ],
                )
                .await;
            }
            Err(WorkerError::Transport(err)) => {
                // Delivery failures are reported, not retried.
                self.metrics.job_failures.inc();
                error!("Result delivery failed: {err}");
            }
        }
        Ok(true)
    }

    /// Run until `terminate` is set and the queue is drained.
    pub async fn run(&self, terminate: Arc<AtomicBool>) -> Result<(), WorkerError> {
        info!(queue = %self.queue, "Worker started");
        loop {
            match self.process_next().await {
                Ok(true) => {}
                Ok(false) => {
                    if terminate.load(Ordering::SeqCst) {
                        info!(queue = %self.queue, "Worker drained, shutting down");
                        return Ok(());
                    }
                    // Queue empty, avoid busy-spin.
                    sleep(Duration::from_millis(10)).await;
                }
                Err(WorkerError::Transport(err)) => {
                    warn!(queue = %self.queue, "Consume failed: {err}");
                    if terminate.load(Ordering::SeqCst) {
                        return Err(err.into());
                    }
                    sleep(Duration::from_millis(10)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Spawn `concurrency` workers round-robined across the queue fleet.
pub fn spawn_workers<E, C, T>(
    engine: Arc<E>,
    results: Arc<C>,
    transport: Arc<T>,
    queues: &[String],
    concurrency: usize,
    metrics: MetricsRecorder,
    terminate: Arc<AtomicBool>,
) -> Vec<JoinHandle<Result<(), WorkerError>>>
where
    E: EmulationEngine + 'static,
    C: ResultChannel + 'static,
    T: BrokerTransport + 'static,
{
    if queues.is_empty() {
        return Vec::new();
    }
    (0..concurrency)
        .map(|i| {
            let worker = Worker::new(
                engine.clone(),
                results.clone(),
                transport.clone(),
                queues[i % queues.len()].clone(),
                metrics.clone(),
            );
            let terminate = terminate.clone();
            tokio::spawn(async move { worker.run(terminate).await })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use natlabb_broker::{
        BrokerClient, CorrelationId, InMemoryBroker, InMemoryResultStore, TransportError,
    };
    use natlabb_engine::ReferenceEngine;
    use natlabb_topology::{CaptureArtifact, EventGroup};
    use std::sync::atomic::AtomicU32;

    const TOPOLOGY: &str = r#"{
        "nodes": [{"id": "h1"}, {"id": "h2"}],
        "edges": [{"source": "h1", "target": "h2"}],
        "jobs": [{"node": "h1", "command": "ping", "args": ["-c", "1", "h2"]}]
    }"#;

    fn harness() -> (
        Arc<InMemoryBroker>,
        Arc<InMemoryResultStore>,
        BrokerClient<InMemoryBroker>,
    ) {
        let broker = Arc::new(InMemoryBroker::new());
        let store = Arc::new(InMemoryResultStore::new());
        let client = BrokerClient::new(
            broker.clone(),
            "natlabb.jobs",
            (0..3).map(|i| format!("emulation-{}", i)).collect(),
            vec!["localhost:5672".into()],
        )
        .unwrap()
        .with_submit_delay(Duration::from_millis(1));
        (broker, store, client)
    }

    fn worker_for(
        broker: &Arc<InMemoryBroker>,
        store: &Arc<InMemoryResultStore>,
        queue: &str,
        engine: ReferenceEngine,
    ) -> Worker<ReferenceEngine, InMemoryResultStore, InMemoryBroker> {
        Worker::new(
            Arc::new(engine),
            store.clone(),
            broker.clone(),
            queue,
            MetricsRecorder::new(),
        )
    }

    #[tokio::test]
    async fn submitted_job_round_trips_to_result_store() {
        let (broker, store, client) = harness();
        client
            .connect_with_retry(false, Duration::from_millis(1))
            .await
            .unwrap();

        let job = EmulationJob::new(Bytes::from_static(TOPOLOGY.as_bytes()));
        let id = job.id().clone();
        let queue = client.submit(job).await.unwrap();

        let worker = worker_for(&broker, &store, &queue, ReferenceEngine::new(42));
        assert!(worker.process_next().await.unwrap());

        let result = store.take(&id).unwrap();
        let groups: Vec<EventGroup> = serde_json::from_slice(&result.trace).unwrap();
        assert!(!groups.is_empty());
        for group in &groups {
            for event in group {
                assert_eq!(event.config.duplicate_percentage, 0.0);
                assert_eq!(event.config.loss_percentage, 0.0);
            }
        }
        assert_eq!(result.captures.len(), 1);
    }

    #[tokio::test]
    async fn always_failing_engine_delivers_empty_placeholder() {
        let (broker, store, client) = harness();
        client
            .connect_with_retry(false, Duration::from_millis(1))
            .await
            .unwrap();

        let job = EmulationJob::new(Bytes::from_static(TOPOLOGY.as_bytes()));
        let id = job.id().clone();
        let queue = client.submit(job).await.unwrap();

        let engine = ReferenceEngine::with_fault_probability(42, 1.0);
        let worker = worker_for(&broker, &store, &queue, engine);
        assert!(worker.process_next().await.unwrap());

        let result = store.take(&id).unwrap();
        assert_eq!(result.trace, b"[]");
        assert!(result.captures.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_without_result() {
        let (broker, store, client) = harness();
        client
            .connect_with_retry(false, Duration::from_millis(1))
            .await
            .unwrap();

        let job = EmulationJob::new(Bytes::from_static(b"not json"));
        let id = job.id().clone();
        let queue = client.submit(job).await.unwrap();

        let worker = worker_for(&broker, &store, &queue, ReferenceEngine::new(42));
        assert!(worker.process_next().await.unwrap());
        assert!(store.take(&id).is_none());
    }

    /// Rejects every delivery, counting the attempts.
    struct FailingResultStore {
        attempts: AtomicU32,
    }

    impl ResultChannel for FailingResultStore {
        fn deliver(
            &self,
            correlation_id: &CorrelationId,
            _encoded_trace: Vec<u8>,
            _captures: Vec<CaptureArtifact>,
        ) -> Result<(), TransportError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Delivery {
                correlation_id: correlation_id.to_string(),
                reason: "result store offline".into(),
            })
        }
    }

    #[tokio::test]
    async fn failed_delivery_is_reported_once_and_not_retried() {
        let (broker, _store, client) = harness();
        client
            .connect_with_retry(false, Duration::from_millis(1))
            .await
            .unwrap();

        let job = EmulationJob::new(Bytes::from_static(TOPOLOGY.as_bytes()));
        let queue = client.submit(job).await.unwrap();

        let failing = Arc::new(FailingResultStore {
            attempts: AtomicU32::new(0),
        });
        let metrics = MetricsRecorder::new();
        let worker = Worker::new(
            Arc::new(ReferenceEngine::new(42)),
            failing.clone(),
            broker.clone(),
            queue,
            metrics.clone(),
        );

        assert!(worker.process_next().await.unwrap());
        assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.job_failures.get(), 1.0);
        // The delivery was consumed with the failure; nothing is redelivered.
        assert!(!worker.process_next().await.unwrap());
    }

    #[tokio::test]
    async fn empty_queue_reports_idle() {
        let (broker, store, client) = harness();
        client
            .connect_with_retry(false, Duration::from_millis(1))
            .await
            .unwrap();

        let worker = worker_for(&broker, &store, "emulation-0", ReferenceEngine::new(42));
        assert!(!worker.process_next().await.unwrap());
    }
}
