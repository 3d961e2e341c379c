//! Suite runner
//!
//! Executes the configured benchmark cases through the timing harness and
//! prints their measurements.

use std::hint::black_box;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::task::JoinError;

use crate::config::{CaseConfig, Mode, SuiteConfig, Workload};
use crate::core::{run_concurrent, run_concurrent_async, run_sequential, run_sequential_capture, HarnessError};
use crate::error::BenchError;
use crate::stats::measurement::Measurement;
use crate::ui::report::{print_header, print_results, progress_bar, OutputFormat};

// ============================================================================
// WORK UNITS
// ============================================================================

/// A configured workload plus the call counter shared by its invocations.
#[derive(Debug)]
pub struct WorkUnit {
    workload: Workload,
    calls: AtomicU64,
}

impl WorkUnit {
    pub fn new(workload: Workload) -> Self {
        Self {
            workload,
            calls: AtomicU64::new(0),
        }
    }

    /// Number of completed invocations so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Run the workload once on the current thread.
    pub fn call(&self) -> u64 {
        let value = match &self.workload {
            Workload::Spin { iterations } => spin(*iterations),
            Workload::Sleep { micros } => {
                std::thread::sleep(Duration::from_micros(*micros));
                *micros
            }
            Workload::Allocate { bytes } => allocate(*bytes),
            // One read-modify-write, so concurrent callers never share a value.
            Workload::Counter => return self.calls.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.calls.fetch_add(1, Ordering::SeqCst);
        value
    }

    /// Run the workload once, sleeping on the tokio timer instead of the thread.
    pub async fn call_async(&self) -> u64 {
        match &self.workload {
            Workload::Sleep { micros } => {
                tokio::time::sleep(Duration::from_micros(*micros)).await;
                self.calls.fetch_add(1, Ordering::SeqCst);
                *micros
            }
            _ => self.call(),
        }
    }
}

fn spin(iterations: u64) -> u64 {
    let mut acc = 0u64;
    for i in 0..iterations {
        acc = acc.wrapping_add(black_box(i).wrapping_mul(31));
    }
    black_box(acc)
}

fn allocate(bytes: usize) -> u64 {
    let buffer = vec![0xA5u8; bytes];
    black_box(&buffer);
    buffer.len() as u64
}

// ============================================================================
// CASE EXECUTION
// ============================================================================

/// Result of running one case
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub name: String,
    pub mode: Mode,
    pub runs: i64,
    pub measurement: Measurement<String>,
}

impl CaseOutcome {
    pub fn elapsed(&self) -> Duration {
        self.measurement.elapsed()
    }
}

fn without_result(measurement: Measurement) -> Measurement<String> {
    measurement.map_result(|()| String::new())
}

/// Run one case through the harness entry point selected by its mode.
///
/// Blocking modes run on tokio's blocking pool so the runtime stays free.
pub async fn run_case(case: &CaseConfig) -> Result<CaseOutcome, BenchError> {
    let unit = Arc::new(WorkUnit::new(case.workload.clone()));
    let runs = case.runs;
    tracing::info!(case = %case.name, mode = %case.mode, runs, "running case");

    let measured: Result<Measurement<String>, HarnessError> = match case.mode {
        Mode::Sequential => {
            let unit = Arc::clone(&unit);
            blocking(&case.name, move || {
                run_sequential(
                    || {
                        black_box(unit.call());
                    },
                    runs,
                )
                .map(without_result)
            })
            .await?
        }
        Mode::Capture => {
            let unit = Arc::clone(&unit);
            blocking(&case.name, move || {
                run_sequential_capture(|| unit.call(), runs).map(|m| m.map_result(|v| v.to_string()))
            })
            .await?
        }
        Mode::Concurrent => {
            let unit = Arc::clone(&unit);
            blocking(&case.name, move || {
                run_concurrent(
                    || {
                        black_box(unit.call());
                    },
                    runs,
                )
                .map(without_result)
            })
            .await?
        }
        Mode::ConcurrentAsync => {
            let shared = Arc::clone(&unit);
            run_concurrent_async(
                move || {
                    let unit = Arc::clone(&shared);
                    async move {
                        black_box(unit.call_async().await);
                    }
                },
                runs,
            )
            .await
            .map(without_result)
        }
    };

    let measurement = measured.map_err(|source| BenchError::Harness {
        case: case.name.clone(),
        source,
    })?;
    tracing::debug!(case = %case.name, calls = unit.calls(), elapsed = ?measurement.elapsed(), "case finished");

    Ok(CaseOutcome {
        name: case.name.clone(),
        mode: case.mode,
        runs,
        measurement,
    })
}

/// Run a blocking harness call on the blocking pool, re-raising its panic.
async fn blocking<T, F>(case: &str, f: F) -> Result<T, BenchError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| join_failure(case, err))
}

fn join_failure(case: &str, err: JoinError) -> BenchError {
    if err.is_panic() {
        panic::resume_unwind(err.into_panic());
    }
    tracing::warn!(case, "blocking harness task was cancelled");
    BenchError::Harness {
        case: case.to_string(),
        source: HarnessError::Cancelled,
    }
}

/// Run every case in order; the first failure aborts the suite.
pub async fn run_suite(config: &SuiteConfig, progress: &ProgressBar) -> Result<Vec<CaseOutcome>, BenchError> {
    let mut outcomes = Vec::with_capacity(config.cases.len());
    for case in &config.cases {
        progress.set_message(case.name.clone());
        let outcome = run_case(case).await?;
        outcomes.push(outcome);
        progress.inc(1);
    }
    progress.finish_with_message("suite completed");
    Ok(outcomes)
}

/// Print the system header, run the suite and print its results.
pub async fn run_benchmark(config: &SuiteConfig, format: OutputFormat) -> Result<Vec<CaseOutcome>, BenchError> {
    print_header();

    let progress = progress_bar(config.cases.len() as u64);
    let outcomes = match run_suite(config, &progress).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            progress.abandon_with_message("suite aborted");
            return Err(e);
        }
    };

    print_results(&outcomes, format);
    Ok(outcomes)
}
