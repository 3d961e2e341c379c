//! Measurement record produced by every harness run
//!
//! This module holds the start/end boundaries of one run and, for the
//! capturing variant, the value returned by the last call.

use std::fmt;
use std::time::{Duration, Instant};

use crate::utils::helpers::format_elapsed;

/// Wall-clock boundaries of one harness run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement<R = ()> {
    start: Instant,
    end: Instant,
    last_result: Option<R>,
}

impl<R> Measurement<R> {
    pub(crate) fn new(start: Instant, end: Instant) -> Self {
        Self {
            start,
            end,
            last_result: None,
        }
    }

    pub(crate) fn with_result(start: Instant, end: Instant, last_result: Option<R>) -> Self {
        Self {
            start,
            end,
            last_result,
        }
    }

    /// Instant recorded right before the first repetition.
    pub fn start(&self) -> Instant {
        self.start
    }

    /// Instant recorded once every repetition has completed.
    pub fn end(&self) -> Instant {
        self.end
    }

    /// Time between `start` and `end`.
    pub fn elapsed(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Value returned by the last call, when the run captured one.
    pub fn last_result(&self) -> Option<&R> {
        self.last_result.as_ref()
    }

    pub fn into_last_result(self) -> Option<R> {
        self.last_result
    }

    /// Convert the captured result, keeping both instants.
    pub fn map_result<S, F>(self, f: F) -> Measurement<S>
    where
        F: FnOnce(R) -> S,
    {
        Measurement {
            start: self.start,
            end: self.end,
            last_result: self.last_result.map(f),
        }
    }

    /// Render `"<label> <elapsed>"`, or just the elapsed time for an empty label.
    pub fn render(&self, label: impl fmt::Display) -> String {
        let label = label.to_string();
        if label.is_empty() {
            format_elapsed(self.elapsed())
        } else {
            format!("{} {}", label, format_elapsed(self.elapsed()))
        }
    }

    /// Print the rendered line to stdout.
    pub fn report(&self, label: impl fmt::Display) {
        println!("{}", self.render(label));
    }
}

impl<R> fmt::Display for Measurement<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_elapsed(self.elapsed()))
    }
}
