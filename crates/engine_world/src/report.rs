//! Diagnostic reporting.
//!
//! The world never logs through a global on its own initiative: it is handed a
//! [`Reporter`] when it is built and routes every non-fatal failure there.
//! [`TracingReporter`] forwards to `tracing`; [`MemoryReporter`] keeps the
//! diagnostics around for tests and debug overlays.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, warn};

use crate::error::{Severity, WorldError};

/// Sink for errors the world handled locally.
pub trait Reporter {
    /// Called once per handled error, after the world has finished reacting.
    fn report(&self, error: &WorldError);
}

/// Forwards diagnostics to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, err: &WorldError) {
        match err.severity() {
            Severity::Warn => warn!(target: "engine_world", error = %err, "world operation ignored"),
            Severity::Error => error!(target: "engine_world", error = %err, "world callback failed"),
        }
    }
}

/// A rendered diagnostic kept by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Collects diagnostics in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Number of diagnostics reported so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drain the buffer.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, err: &WorldError) {
        self.entries.borrow_mut().push(Diagnostic {
            severity: err.severity(),
            message: err.to_string(),
        });
    }
}
