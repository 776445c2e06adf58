//! Error kinds raised by the pure tree logic.

use thiserror::Error;

/// Failures surfaced by tree queries, rendering and snapshot re-attachment.
///
/// None of these are recovered locally; they indicate either a wrong query or
/// a page shape the renderer does not understand.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// Attribute missing from the node's properties and from its time value.
    #[error("'{category}' object has no attribute '{attribute}'")]
    UnknownAttribute { category: String, attribute: String },

    /// Children violate the structure the renderer expects for this category.
    #[error("unexpected shape for {category} '{name}': {reason}")]
    UnexpectedShape {
        category: String,
        name: String,
        reason: String,
    },

    /// A regex matcher failed to compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A snapshot references node indices that do not exist.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl TreeError {
    pub(crate) fn shape(category: &str, name: &str, reason: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            category: category.to_string(),
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
