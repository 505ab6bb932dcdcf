//! Error types for document translation.

use mpe_schema::SchemaError;

/// Result type for all translation operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Unified error type for import and export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input text is not valid JSON, even after comment removal.
    #[error("Malformed document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A recognition or action type name is not part of the catalog.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The document parses but has an unusable shape.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A connection entry is neither a name nor a `{name, ..}` object.
    #[error("Invalid node reference {reference}: {reason}")]
    InvalidReference { reference: String, reason: String },
}

impl Error {
    /// Creates an [`Error::InvalidDocument`].
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    /// Creates an [`Error::InvalidReference`] for `reference`.
    pub fn invalid_reference(reference: &serde_json::Value, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
