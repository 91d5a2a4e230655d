//! Debounce scheduling for Settle
//!
//! This crate provides:
//! - Trailing-edge debouncing (last call wins, one invocation per quiet period)
//! - Pluggable timer backends (tokio tasks, or a manual virtual clock)
//! - Failure reporting for callables that error or panic when they fire
//! - Serializable configuration with range validation

pub mod config;
pub mod debounce;
pub mod error;
pub mod report;
pub mod timer;

// Re-exports
pub use config::{delay_from_millis, DebounceConfig, MAX_DELAY_MS};
pub use debounce::{debounce, DebounceBuilder, DebounceStats, Debounced};
pub use error::DebounceError;
pub use report::{FailureKind, FailureReporter, InvocationFailure, TracingReporter};
pub use timer::{ManualTimer, Timer, TimerCallback, TimerHandle, TokioTimer};

/// Result type for debounce construction
pub type Result<T> = std::result::Result<T, DebounceError>;
