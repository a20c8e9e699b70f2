//! Custom error types for the nanoscope-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum NanoscopeError {
    /// An error originating from I/O operations (open, seek, read).
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A header line or scan record field that is required was not found.
    #[error("Missing field: {field}")]
    MissingField { field: String },

    /// A field was present but its value could not be interpreted.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The requested layer index does not exist in the scan registry.
    #[error("Layer {layer} out of range: file has {count} layer(s)")]
    LayerOutOfRange { layer: usize, count: usize },
}

impl NanoscopeError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        NanoscopeError::MissingField { field: field.into() }
    }
}

/// A convenience `Result` type alias using the crate's `NanoscopeError` type.
pub type Result<T> = std::result::Result<T, NanoscopeError>;
