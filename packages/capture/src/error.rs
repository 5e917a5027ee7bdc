//! Typed errors for the capture library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Page source unavailable or failed
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Export envelope failed validation
    #[error("invalid export: {reason}")]
    InvalidExport { reason: String },
}

impl CaptureError {
    /// Wrap an arbitrary error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Build a storage failure from a plain message.
    pub fn storage_msg(message: impl Into<String>) -> Self {
        Self::Storage(message.into().into())
    }
}

/// Errors raised by a page source when a snapshot cannot be taken.
#[derive(Debug, Error)]
pub enum PageError {
    /// The page could not be read (navigated away, torn down, detached)
    #[error("page unavailable: {0}")]
    Unavailable(String),
}

/// Per-candidate failures during message extraction.
///
/// These never abort an extraction pass: the offending element is
/// logged and skipped, and the pass returns whatever else it found.
#[derive(Debug, Error)]
pub enum ElementError {
    /// Element matched a message selector but has no usable text
    #[error("element has no usable text content")]
    EmptyContent,

    /// No classification rule could resolve the element's actor
    #[error("could not resolve actor for element")]
    Unclassifiable,
}

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
