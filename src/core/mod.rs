//! Timing harness
//!
//! Measures the wall-clock time of running a unit of work `n` times under one
//! of three execution models: sequential, sequential with capture of the last
//! result, and concurrent fan-out joined by a completion latch.

mod error;
pub mod latch;

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

pub use error::HarnessError;
pub use latch::{CompletionLatch, LatchGuard};

use crate::stats::measurement::Measurement;

// ============================================================================
// REPETITION COUNT
// ============================================================================

/// Convert a caller-supplied count, failing fast on negative or oversized values.
fn repetitions<N>(n: N) -> Result<usize, HarnessError>
where
    N: TryInto<usize> + Copy + fmt::Display,
{
    n.try_into().map_err(|_| HarnessError::InvalidCount {
        value: n.to_string(),
    })
}

// ============================================================================
// SEQUENTIAL
// ============================================================================

/// Run `work` exactly `n` times in call order.
///
/// ```
/// let m = bench_harness::run_sequential(|| {}, 3).unwrap();
/// assert!(m.end() >= m.start());
/// assert!(m.last_result().is_none());
/// ```
pub fn run_sequential<F, N>(mut work: F, n: N) -> Result<Measurement, HarnessError>
where
    F: FnMut(),
    N: TryInto<usize> + Copy + fmt::Display,
{
    let runs = repetitions(n)?;
    tracing::debug!(runs, "sequential run starting");

    let start = Instant::now();
    for _ in 0..runs {
        work();
    }
    let end = Instant::now();

    tracing::debug!(runs, elapsed = ?end.duration_since(start), "sequential run finished");
    Ok(Measurement::new(start, end))
}

/// Run `work` exactly `n` times in call order and keep the value returned by
/// the last call.
///
/// Earlier values are dropped as soon as the next call starts. With `n == 0`
/// nothing runs and no result is captured.
pub fn run_sequential_capture<F, R, N>(mut work: F, n: N) -> Result<Measurement<R>, HarnessError>
where
    F: FnMut() -> R,
    N: TryInto<usize> + Copy + fmt::Display,
{
    let runs = repetitions(n)?;
    tracing::debug!(runs, "capturing run starting");

    let start = Instant::now();
    let mut last = None;
    for _ in 0..runs {
        // Drop the previous value before the next call begins.
        drop(last.take());
        last = Some(work());
    }
    let end = Instant::now();

    tracing::debug!(runs, elapsed = ?end.duration_since(start), "capturing run finished");
    Ok(Measurement::with_result(start, end, last))
}

// ============================================================================
// CONCURRENT FAN-OUT
// ============================================================================

/// Launch `n` concurrent invocations of `work` on their own threads and wait
/// for all of them on a completion latch.
///
/// `end` is recorded only after the latch releases. A unit that panics still
/// counts the latch down; the first panic is re-raised here once every unit
/// has finished. No result is captured, as completion order is undefined.
pub fn run_concurrent<F, N>(work: F, n: N) -> Result<Measurement, HarnessError>
where
    F: Fn() + Sync,
    N: TryInto<usize> + Copy + fmt::Display,
{
    let runs = repetitions(n)?;
    tracing::debug!(runs, "concurrent run starting");

    let latch = CompletionLatch::new(runs);
    let work = &work;
    let latch_ref = &latch;

    let start = Instant::now();
    let end = thread::scope(|scope| {
        for index in 0..runs {
            let spawned = thread::Builder::new()
                .name(format!("bench-unit-{}", index))
                .spawn_scoped(scope, move || {
                    let _guard = latch_ref.guard();
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(work)) {
                        latch_ref.record_panic(payload);
                    }
                });

            if let Err(source) = spawned {
                tracing::warn!(launched = index, runs, error = %source, "worker spawn failed");
                latch_ref.abandon(runs - index);
                return Err(HarnessError::Spawn {
                    launched: index,
                    source,
                });
            }
        }

        latch_ref.wait();
        Ok(Instant::now())
    });

    // A spawn failure still waits for launched units; surface their panic first.
    if let Some(payload) = latch.take_panic() {
        panic::resume_unwind(payload);
    }
    let end = end?;

    tracing::debug!(runs, elapsed = ?end.duration_since(start), "concurrent run finished");
    Ok(Measurement::new(start, end))
}

/// Async counterpart of [`run_concurrent`]: `n` tokio tasks, each awaiting one
/// future produced by `work`, joined by the same completion latch.
///
/// Must be called from within a tokio runtime.
pub async fn run_concurrent_async<F, Fut, N>(work: F, n: N) -> Result<Measurement, HarnessError>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
    N: TryInto<usize> + Copy + fmt::Display,
{
    let runs = repetitions(n)?;
    tracing::debug!(runs, "async concurrent run starting");

    let latch = Arc::new(CompletionLatch::new(runs));
    let work = Arc::new(work);

    let start = Instant::now();
    let mut handles = Vec::with_capacity(runs);
    for _ in 0..runs {
        let latch = Arc::clone(&latch);
        let work = Arc::clone(&work);
        handles.push(tokio::spawn(async move {
            let _guard = latch.guard();
            (*work)().await;
        }));
    }
    latch.wait_async().await;
    let end = Instant::now();

    // Every task has already finished; this only collects their outcomes.
    for handle in handles {
        if let Err(err) = handle.await {
            if err.is_panic() {
                panic::resume_unwind(err.into_panic());
            }
            return Err(HarnessError::Cancelled);
        }
    }

    tracing::debug!(runs, elapsed = ?end.duration_since(start), "async concurrent run finished");
    Ok(Measurement::new(start, end))
}
