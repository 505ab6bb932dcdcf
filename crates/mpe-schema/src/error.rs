//! Schema error types.

use thiserror::Error;

use crate::FieldType;

/// Errors raised when a type name does not belong to a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// No recognition type matches the name, ignoring ASCII case.
    #[error("unknown recognition type: {0}")]
    UnknownRecognitionType(String),

    /// No action type matches the name, ignoring ASCII case.
    #[error("unknown action type: {0}")]
    UnknownActionType(String),
}

/// A value could not be coerced into the requested field type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value {value} does not match type `{expected}`")]
pub struct CoerceError {
    /// The type the value was tested against.
    pub expected: FieldType,
    /// Compact JSON rendering of the rejected value.
    pub value: String,
}

impl CoerceError {
    pub(crate) fn new(expected: FieldType, value: &serde_json::Value) -> Self {
        Self {
            expected,
            value: value.to_string(),
        }
    }
}
