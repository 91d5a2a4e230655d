//! Failure reporting for debounced invocations
//!
//! A debounced callable runs on a timer, long after the caller that
//! triggered it has returned. Its failures therefore have nowhere to
//! propagate to; they are handed to a [`FailureReporter`] instead.

use std::any::Any;
use std::fmt;

/// How a debounced invocation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The callable returned `Err`
    Error(String),
    /// The callable panicked
    Panic(String),
}

/// A failed invocation of a debounced callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationFailure {
    /// Label of the wrapper whose callable failed
    pub label: String,
    /// What went wrong
    pub kind: FailureKind,
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FailureKind::Error(msg) => write!(f, "debounced call '{}' failed: {}", self.label, msg),
            FailureKind::Panic(msg) => write!(f, "debounced call '{}' panicked: {}", self.label, msg),
        }
    }
}

/// Sink for invocation failures
///
/// Implementations must not panic.
pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &InvocationFailure);
}

impl<F> FailureReporter for F
where
    F: Fn(&InvocationFailure) + Send + Sync,
{
    fn report(&self, failure: &InvocationFailure) {
        self(failure)
    }
}

/// Default reporter: emits a `tracing` error event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &InvocationFailure) {
        match &failure.kind {
            FailureKind::Error(msg) => {
                tracing::error!(label = %failure.label, error = %msg, "Debounced call failed");
            }
            FailureKind::Panic(msg) => {
                tracing::error!(label = %failure.label, panic = %msg, "Debounced call panicked");
            }
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_display() {
        let failure = InvocationFailure {
            label: "search".to_string(),
            kind: FailureKind::Error("boom".to_string()),
        };
        assert_eq!(failure.to_string(), "debounced call 'search' failed: boom");

        let failure = InvocationFailure {
            label: "resize".to_string(),
            kind: FailureKind::Panic("oops".to_string()),
        };
        assert_eq!(failure.to_string(), "debounced call 'resize' panicked: oops");
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = move |failure: &InvocationFailure| sink.lock().push(failure.clone());

        let failure = InvocationFailure {
            label: "x".to_string(),
            kind: FailureKind::Error("bad".to_string()),
        };
        reporter.report(&failure);
        TracingReporter.report(&failure);

        assert_eq!(seen.lock().as_slice(), &[failure]);
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = std::panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");

        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
