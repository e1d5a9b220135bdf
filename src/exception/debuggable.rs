use crate::exception::{BoxError, DiagnosticCapable};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

/// Wraps an error together with a backtrace captured at construction.
///
/// The backtrace follows the usual `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`
/// rules unless [`Debuggable::force`] is used.
#[derive(Debug)]
pub struct Debuggable {
    error: BoxError,
    backtrace: Backtrace,
}

impl Debuggable {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self {
            error: error.into(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Capture a backtrace regardless of environment variables
    pub fn force(error: impl Into<BoxError>) -> Self {
        Self {
            error: error.into(),
            backtrace: Backtrace::force_capture(),
        }
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for Debuggable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for Debuggable {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.error.as_ref() as &(dyn Error + 'static))
    }
}

impl DiagnosticCapable for Debuggable {
    fn diagnostic(&self) -> String {
        let mut text = self.error.to_string();
        let mut cause = self.error.source();
        while let Some(err) = cause {
            text.push_str("\nCaused by: ");
            text.push_str(&err.to_string());
            cause = err.source();
        }
        if self.backtrace.status() == BacktraceStatus::Captured {
            text.push_str("\n\n");
            text.push_str(&self.backtrace.to_string());
        }
        text
    }
}
