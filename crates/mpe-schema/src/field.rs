//! Declared field types and field definitions.

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// Value shape a pipeline parameter may declare.
///
/// The string form matches the notation used by the pipeline protocol
/// documentation, e.g. `list<array<int, 4>>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum FieldType {
    /// Integer.
    #[strum(serialize = "int")]
    Int,
    /// Floating point number.
    #[strum(serialize = "double")]
    Double,
    /// The boolean literal `true`.
    #[strum(serialize = "true")]
    True,
    /// Boolean.
    #[strum(serialize = "bool")]
    Bool,
    /// String.
    #[strum(serialize = "string")]
    String,
    /// List of integers.
    #[strum(serialize = "list<int, >")]
    IntList,
    /// List of equally sized integer lists.
    #[strum(serialize = "list<list<int, >>")]
    IntListList,
    /// List of numbers.
    #[strum(serialize = "list<double, >")]
    DoubleList,
    /// List of strings.
    #[strum(serialize = "list<string, >")]
    StringList,
    /// Rectangle `[x, y, w, h]`.
    #[strum(serialize = "array<int, 4>")]
    Xywh,
    /// List of rectangles.
    #[strum(serialize = "list<array<int, 4>>")]
    XywhList,
    /// List of positions: `true`, a node name, or a 2/4 integer tuple.
    #[strum(serialize = "list<true | string | array<int, 4>>")]
    PositionList,
    /// Point `[x, y]`.
    #[strum(serialize = "array<int, 2>")]
    IntPair,
    /// Pair of strings.
    #[strum(serialize = "array<string, 2>")]
    StringPair,
    /// List of string pairs.
    #[strum(serialize = "list<array<string, 2>>")]
    StringPairList,
    /// Any JSON value.
    #[strum(serialize = "any")]
    Any,
    /// List of JSON objects.
    #[strum(serialize = "list<object,>")]
    ObjectList,
}

/// Declaration of a single parameter: its key and candidate types.
///
/// Candidate types are tried in declaration order during coercion, so the
/// order of `types` is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Parameter key as it appears in documents.
    pub key: &'static str,
    /// Candidate types, most specific first.
    pub types: &'static [FieldType],
    /// Whether the protocol requires the parameter.
    pub required: bool,
    /// Default value as JSON text.
    pub default: &'static str,
}

impl FieldDef {
    /// Creates an optional field definition.
    pub const fn new(key: &'static str, types: &'static [FieldType], default: &'static str) -> Self {
        Self {
            key,
            types,
            required: false,
            default,
        }
    }

    /// Marks the field as required.
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the default value.
    pub fn default_value(&self) -> Value {
        serde_json::from_str(self.default).unwrap_or(Value::Null)
    }
}

/// Finds the definition for `key` in a parameter list.
pub fn find_field<'a>(defs: &'a [FieldDef], key: &str) -> Option<&'a FieldDef> {
    defs.iter().find(|def| def.key == key)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_field_type_display_uses_protocol_notation() {
        assert_eq!(FieldType::Xywh.to_string(), "array<int, 4>");
        assert_eq!(
            FieldType::from_str("list<object,>").unwrap(),
            FieldType::ObjectList
        );
    }

    #[test]
    fn test_field_def_default_value() {
        const ROI: FieldDef = FieldDef::new("roi", &[FieldType::Xywh], "[0, 0, 0, 0]");
        assert_eq!(ROI.default_value(), serde_json::json!([0, 0, 0, 0]));
        assert!(!ROI.required);
        assert!(ROI.required().required);
    }
}
