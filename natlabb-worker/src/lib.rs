//! ## natlabb-worker
//! The consuming side of the job layer.
//!
//! Each worker pulls one job at a time off its queue and processes it fully
//! (decode, retry-driven engine execution, encode, result delivery) before
//! pulling the next. Workers share nothing mutable; parallelism comes from
//! running many of them across the queue fleet.

mod error;
mod worker;

pub use error::WorkerError;
pub use worker::{spawn_workers, Worker};
