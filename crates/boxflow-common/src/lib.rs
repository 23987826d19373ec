//! Common utilities for the boxflow layout engine.
//!
//! This crate provides shared infrastructure used by all layout components:
//! - **Warning System** - deduplicated warnings routed through the `log` facade
//! - **Diagnostics** - structured misuse reports with pluggable sinks

pub mod diagnostic;
pub mod warning;

pub use diagnostic::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, LogSink};
