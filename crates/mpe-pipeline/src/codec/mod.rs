//! Conversion between graph nodes and document node objects.

mod decode;
mod encode;

pub use decode::{CONNECTION_KEYS, is_connection_key, migrate_legacy, parse_field};
pub use encode::{Encoded, FieldSection, TypeMismatch, encode_node, encode_stub};
