//! Structured diagnostics emitted during layout.
//!
//! Layout never aborts on misuse. Instead it reports a [`Diagnostic`] to a
//! [`DiagnosticSink`] and carries on with no-op geometry for the offending
//! element. Every misuse event is reported exactly once; unlike
//! [`crate::warning::warn_once`] the sinks here do not deduplicate.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The category of a layout diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An element with a table-internal display value (`table-row`,
    /// `table-cell`, ...) was found outside of a table.
    TableDisplayOutsideTable,
    /// A block's child loop hit the restart safety bound and continued
    /// without restarting.
    RestartLimitReached,
    /// A document description contained a value the loader could not use.
    InvalidDocumentValue,
}

impl DiagnosticKind {
    /// Short stable identifier, used as the log target suffix.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TableDisplayOutsideTable => "table-display-outside-table",
            Self::RestartLimitReached => "restart-limit-reached",
            Self::InvalidDocumentValue => "invalid-document-value",
        }
    }
}

/// A single advisory message produced during layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Human readable message, including the element address.
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)
    }
}

/// Receiver for layout diagnostics.
pub trait DiagnosticSink {
    /// Record one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to `log::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!(target: "boxflow::layout", "{diagnostic}");
    }
}

/// Keeps every diagnostic in memory (and still logs it).
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    /// Diagnostics in the order they were reported.
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingSink {
    /// Create an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Number of recorded diagnostics of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!(target: "boxflow::layout", "{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}

/// A shared sink, so a caller can keep reading what the engine reported.
impl<S: DiagnosticSink> DiagnosticSink for Rc<RefCell<S>> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.borrow_mut().report(diagnostic);
    }
}
