//! Shared error-reporting surface.
//!
//! Recoverable faults (e.g. a corrupt index record that was skipped rather
//! than fatal) are not returned to the caller — they're handed to an
//! [`ErrorReporter`] instead, so the library never forces a choice between
//! "fail the call" and "silently swallow the problem".

use std::error::Error as StdError;
use std::fmt;

/// Receives recoverable errors the library encountered but did not need to
/// propagate.
pub trait ErrorReporter: fmt::Debug + Send + Sync {
    fn report(&self, context: &str, err: &(dyn StdError + 'static));
}

/// Reports recoverable errors via `tracing::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, context: &str, err: &(dyn StdError + 'static)) {
        tracing::warn!(context, error = %err, "recoverable error");
    }
}

/// Discards recoverable errors. Useful in tests where log noise isn't wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullErrorReporter;

impl ErrorReporter for NullErrorReporter {
    fn report(&self, _context: &str, _err: &(dyn StdError + 'static)) {}
}
