//! Completion latch for the concurrent execution models
//!
//! A countdown barrier: every launched unit of work holds a guard that counts
//! down exactly once when it is dropped, including while unwinding.

use std::any::Any;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

type PanicPayload = Box<dyn Any + Send + 'static>;

/// Countdown barrier shared by the units of one concurrent harness call.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    released: Condvar,
    notify: Notify,
    panic: Mutex<Option<PanicPayload>>,
}

impl CompletionLatch {
    /// Create a latch that releases after `count` countdowns.
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
            notify: Notify::new(),
            panic: Mutex::new(None),
        }
    }

    /// Number of countdowns still outstanding.
    pub fn remaining(&self) -> usize {
        *self.lock_remaining()
    }

    /// Guard that counts the latch down once when dropped.
    pub fn guard(&self) -> LatchGuard<'_> {
        LatchGuard { latch: self }
    }

    /// Count down `slots` units that will never run.
    pub fn release(&self, slots: usize) {
        let mut remaining = self.lock_remaining();
        if slots > *remaining {
            tracing::warn!(
                slots,
                remaining = *remaining,
                "latch released more slots than outstanding"
            );
        }
        *remaining = remaining.saturating_sub(slots);
        self.signal_if_done(*remaining);
    }

    fn count_down(&self) {
        let mut remaining = self.lock_remaining();
        match remaining.checked_sub(1) {
            Some(left) => *remaining = left,
            None => {
                tracing::warn!("latch counted down past zero");
                return;
            }
        }
        self.signal_if_done(*remaining);
    }

    fn signal_if_done(&self, remaining: usize) {
        if remaining == 0 {
            self.released.notify_all();
            self.notify.notify_waiters();
        }
    }

    /// Block the current thread until every slot has counted down.
    pub fn wait(&self) {
        let mut remaining = self.lock_remaining();
        while *remaining > 0 {
            remaining = self
                .released
                .wait(remaining)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Await release on the tokio runtime. Any number of tasks may wait.
    pub async fn wait_async(&self) {
        loop {
            // Register before checking, so a release in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Give up on `slots` units that were never launched and block until the
    /// launched ones have finished.
    pub fn abandon(&self, slots: usize) {
        self.release(slots);
        self.wait();
    }

    /// Keep the first panic payload raised by a unit of work.
    pub fn record_panic(&self, payload: PanicPayload) {
        let mut slot = self.panic.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(payload);
        } else {
            tracing::debug!("dropping additional panic payload from concurrent unit");
        }
    }

    /// Take the recorded panic payload, if any unit panicked.
    pub fn take_panic(&self) -> Option<PanicPayload> {
        self.panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    // The counter is only mutated under the lock, so a poisoned mutex still
    // holds a consistent value.
    fn lock_remaining(&self) -> MutexGuard<'_, usize> {
        self.remaining.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts its latch down once on drop.
#[derive(Debug)]
pub struct LatchGuard<'a> {
    latch: &'a CompletionLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn zero_count_is_released() {
        let latch = CompletionLatch::new(0);
        assert_eq!(latch.remaining(), 0);
        latch.wait();
    }

    #[test]
    fn guards_count_down_on_drop() {
        let latch = CompletionLatch::new(2);
        {
            let _a = latch.guard();
            let _b = latch.guard();
            assert_eq!(latch.remaining(), 2);
        }
        assert_eq!(latch.remaining(), 0);
        latch.wait();
    }

    #[test]
    fn guard_counts_down_while_unwinding() {
        let latch = CompletionLatch::new(1);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = latch.guard();
            panic!("unit failed");
        }));
        assert!(result.is_err());
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn release_never_underflows() {
        let latch = CompletionLatch::new(3);
        latch.release(5);
        assert_eq!(latch.remaining(), 0);
        drop(latch.guard());
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn wait_blocks_until_other_threads_finish() {
        let latch = Arc::new(CompletionLatch::new(4));
        for _ in 0..4 {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                let _guard = latch.guard();
                thread::sleep(Duration::from_millis(5));
            });
        }
        latch.wait();
        assert_eq!(latch.remaining(), 0);
    }

    #[test]
    fn keeps_only_first_panic_payload() {
        let latch = CompletionLatch::new(0);
        latch.record_panic(Box::new("first"));
        latch.record_panic(Box::new("second"));
        let payload = latch.take_panic().unwrap();
        assert_eq!(*payload.downcast::<&str>().unwrap(), "first");
        assert!(latch.take_panic().is_none());
    }

    #[test]
    fn abandon_waits_for_launched_units_only() {
        let latch = Arc::new(CompletionLatch::new(5));
        let finished = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for _ in 0..2 {
            let latch = Arc::clone(&latch);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                let _guard = latch.guard();
                thread::sleep(Duration::from_millis(10));
                finished.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            });
        }
        latch.abandon(3);
        assert_eq!(latch.remaining(), 0);
        assert_eq!(finished.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn every_async_waiter_is_released() {
        let latch = Arc::new(CompletionLatch::new(1));
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let latch = Arc::clone(&latch);
                tokio::spawn(async move { latch.wait_async().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(latch.guard());

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(2), waiter)
                .await
                .expect("waiter stayed blocked")
                .unwrap();
        }
    }

    #[tokio::test]
    async fn wait_async_returns_when_already_released() {
        let latch = CompletionLatch::new(1);
        drop(latch.guard());
        latch.wait_async().await;
        latch.wait_async().await;
    }

    #[tokio::test]
    async fn wait_async_resumes_after_release() {
        let latch = Arc::new(CompletionLatch::new(3));
        for _ in 0..3 {
            let latch = Arc::clone(&latch);
            tokio::spawn(async move {
                let _guard = latch.guard();
                tokio::time::sleep(Duration::from_millis(2)).await;
            });
        }
        latch.wait_async().await;
        assert_eq!(latch.remaining(), 0);
    }
}
