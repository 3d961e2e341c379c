//! Benchmark Harness Library
//!
//! Timing primitives that measure the wall-clock duration of running a unit of
//! work repeatedly, plus the suite runner and console report built on them.

pub mod config;
pub mod core;
pub mod error;
pub mod stats;
pub mod suite;
pub mod ui;
pub mod utils;

pub use crate::core::{
    run_concurrent, run_concurrent_async, run_sequential, run_sequential_capture, HarnessError,
};
pub use crate::error::BenchError;
pub use crate::stats::measurement::Measurement;
pub use crate::suite::run_benchmark;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
