#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for value coercion.
pub const TRACING_TARGET_COERCE: &str = "mpe_schema::coerce";

mod action;
mod coerce;
mod error;
mod field;
mod other;
mod recognition;

pub use action::ActionType;
pub use coerce::{Coerced, match_all, match_single};
pub use error::{CoerceError, SchemaError};
pub use field::{FieldDef, FieldType, find_field};
pub use other::{OTHER_FIELDS, OTHER_FIELDS_WITHOUT_FOCUS, is_other_field_key};
pub use recognition::RecognitionType;
