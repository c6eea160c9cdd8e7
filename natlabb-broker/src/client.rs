//! Broker client: connection lifecycle, topology declaration, submission.
//!
//! The client is explicitly constructed and explicitly owned; nothing here
//! connects at import time. Transport-level retry (bounded attempts, fixed
//! delay) lives in `submit` and is independent of the engine-level retry
//! controller layered above it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::endpoint::pick_endpoint;
use crate::error::TransportError;
use crate::job::EmulationJob;
use crate::router::JobRouter;
use crate::transport::BrokerTransport;

/// Submission attempt budget.
pub const SUBMIT_ATTEMPTS: u32 = 3;

/// Fixed delay between submission attempts.
pub const SUBMIT_RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct BrokerClient<T: BrokerTransport> {
    transport: Arc<T>,
    router: JobRouter,
    exchange: String,
    endpoints: Vec<String>,
    active: Mutex<Option<String>>,
    submit_delay: Duration,
    retries: AtomicU64,
}

impl<T: BrokerTransport> BrokerClient<T> {
    pub fn new(
        transport: Arc<T>,
        exchange: impl Into<String>,
        queues: Vec<String>,
        endpoints: Vec<String>,
    ) -> Result<Self, TransportError> {
        if endpoints.is_empty() {
            return Err(TransportError::NoEndpoints);
        }
        Ok(Self {
            transport,
            router: JobRouter::new(queues)?,
            exchange: exchange.into(),
            endpoints,
            active: Mutex::new(None),
            submit_delay: SUBMIT_RETRY_DELAY,
            retries: AtomicU64::new(0),
        })
    }

    /// Override the inter-attempt delay. Tests shorten it.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn router(&self) -> &JobRouter {
        &self.router
    }

    pub fn active_endpoint(&self) -> Option<String> {
        self.active.lock().clone()
    }

    /// Cumulative transport-level submission retries since construction.
    pub fn submit_retry_count(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Connect and declare the exchange/queue topology.
    ///
    /// With `retry_on_startup` the client tolerates a transiently
    /// unavailable broker, probing every `probe_interval` until it comes
    /// up; otherwise the first failure is returned.
    pub async fn connect_with_retry(
        &self,
        retry_on_startup: bool,
        probe_interval: Duration,
    ) -> Result<(), TransportError> {
        loop {
            let endpoint = self.select_endpoint()?;
            match self.transport.connect(&endpoint) {
                Ok(()) => {
                    info!(endpoint = %endpoint, "Broker connection established");
                    *self.active.lock() = Some(endpoint);
                    self.declare_topology()?;
                    return Ok(());
                }
                Err(err) if retry_on_startup => {
                    warn!(endpoint = %endpoint, "Broker unavailable, retrying: {err}");
                    sleep(probe_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Declare the exchange and bind every queue under it. Idempotent;
    /// runs once at startup before any job is accepted.
    pub fn declare_topology(&self) -> Result<(), TransportError> {
        self.transport.declare_exchange(&self.exchange)?;
        for queue in self.router.queues() {
            self.transport.declare_queue(&self.exchange, queue)?;
        }
        debug!(
            exchange = %self.exchange,
            queues = self.router.queues().len(),
            "Broker topology declared"
        );
        Ok(())
    }

    /// Reconnect to a uniformly chosen endpoint after a connection loss.
    pub fn failover(&self) -> Result<String, TransportError> {
        let endpoint = self.select_endpoint()?;
        self.transport.connect(&endpoint)?;
        *self.active.lock() = Some(endpoint.clone());
        info!(endpoint = %endpoint, "Failed over to new broker endpoint");
        Ok(endpoint)
    }

    /// Submit one job; the routing key is its correlation id.
    ///
    /// On transport failure, retries up to [`SUBMIT_ATTEMPTS`] times with a
    /// fixed delay between attempts. Exhaustion surfaces to the submitter.
    /// Returns the queue the job was published to.
    pub async fn submit(&self, job: EmulationJob) -> Result<String, TransportError> {
        let queue = self.router.route(job.id().as_str()).to_string();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.transport.publish(&queue, job.clone()) {
                Ok(()) => {
                    debug!(queue = %queue, correlation_id = %job.id(), "Job submitted");
                    return Ok(queue);
                }
                Err(err) if attempts < SUBMIT_ATTEMPTS => {
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        attempt = attempts,
                        queue = %queue,
                        "Submission failed, retrying: {err}"
                    );
                    sleep(self.submit_delay).await;
                    if let Err(failover_err) = self.failover() {
                        warn!("Failover attempt failed: {failover_err}");
                    }
                }
                Err(err) => {
                    return Err(TransportError::Exhausted {
                        attempts,
                        last: err.to_string(),
                    })
                }
            }
        }
    }

    /// Pull the next job off one of the client's queues.
    pub fn consume(&self, queue: &str) -> Result<Option<EmulationJob>, TransportError> {
        self.transport.consume(queue)
    }

    fn select_endpoint(&self) -> Result<String, TransportError> {
        let mut rng = rand::rng();
        pick_endpoint(&self.endpoints, &mut rng)
            .cloned()
            .ok_or(TransportError::NoEndpoints)
    }
}
