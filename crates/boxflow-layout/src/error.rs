//! Error types for the layout crate.
//!
//! Layout conflicts are never errors: they are close results and restart
//! signals handled inside the engine. These enums only cover bad input at
//! the public boundary.

use std::path::PathBuf;

use boxflow_dom::NodeId;
use thiserror::Error;

use crate::style::StyleParseError;

/// Rejected arguments to [`crate::LayoutEngine::layout`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The node id is not part of the document.
    #[error("node {0:?} does not exist in the document")]
    UnknownNode(NodeId),
    /// Only elements can be laid out as a root.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    /// The containing block must be finite and non-negative.
    #[error("invalid containing block {width}x{height}")]
    InvalidContainingBlock {
        /// Requested width.
        width: f32,
        /// Requested height.
        height: f32,
    },
}

/// Failure to load a [`crate::LayoutConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid config JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: f32,
    },
}

/// Failure to build a [`crate::StyledDocument`] from JSON.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The text is not a valid document description.
    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),
    /// A style declaration could not be parsed.
    #[error("invalid style on <{tag}>: {source}")]
    Style {
        /// Tag of the element carrying the style.
        tag: String,
        /// What was wrong with it.
        source: StyleParseError,
    },
    /// The top-level node must be an element.
    #[error("document root must be an element, found text")]
    TextRoot,
}
