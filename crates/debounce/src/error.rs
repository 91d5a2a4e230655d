//! Construction-time errors
//!
//! Failures of the wrapped callable are never surfaced here; they go
//! through [`crate::FailureReporter`] when a timer fires.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DebounceError {
    /// Quiet period given as a negative millisecond count
    #[error("debounce delay must be non-negative, got {0}ms")]
    NegativeDelay(i64),

    /// Quiet period above [`crate::MAX_DELAY_MS`]
    #[error("debounce delay of {millis}ms exceeds the maximum of {max}ms")]
    DelayTooLarge { millis: u128, max: u64 },

    /// No timer was supplied and there is no tokio runtime to fall back on
    #[error("no tokio runtime available to drive debounce timers")]
    NoRuntime,
}
