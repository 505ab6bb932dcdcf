//! Node-level fields shared by every recognition and action type.

use crate::field::{FieldDef, FieldType};

const RATE_LIMIT: FieldDef = FieldDef::new("rate_limit", &[FieldType::Int], "1000");
const TIMEOUT: FieldDef = FieldDef::new("timeout", &[FieldType::Int], "20000");
const PRE_DELAY: FieldDef = FieldDef::new("pre_delay", &[FieldType::Int], "200");
const POST_DELAY: FieldDef = FieldDef::new("post_delay", &[FieldType::Int], "200");
const FOCUS: FieldDef = FieldDef::new("focus", &[FieldType::Any], r#""""#);
const ENABLED: FieldDef = FieldDef::new("enabled", &[FieldType::Bool], "true");
const INVERSE: FieldDef = FieldDef::new("inverse", &[FieldType::Bool], "false");
const PRE_WAIT_FREEZES: FieldDef =
    FieldDef::new("pre_wait_freezes", &[FieldType::Int, FieldType::Any], "0");
const POST_WAIT_FREEZES: FieldDef =
    FieldDef::new("post_wait_freezes", &[FieldType::Int, FieldType::Any], "0");
const ATTACH: FieldDef = FieldDef::new("attach", &[FieldType::Any], "{}");

/// Every other-field declaration, `focus` included.
pub const OTHER_FIELDS: &[FieldDef] = &[
    RATE_LIMIT,
    TIMEOUT,
    PRE_DELAY,
    POST_DELAY,
    FOCUS,
    ENABLED,
    INVERSE,
    PRE_WAIT_FREEZES,
    POST_WAIT_FREEZES,
    ATTACH,
];

/// Other-field declarations without `focus`, which is encoded separately.
pub const OTHER_FIELDS_WITHOUT_FOCUS: &[FieldDef] = &[
    RATE_LIMIT,
    TIMEOUT,
    PRE_DELAY,
    POST_DELAY,
    ENABLED,
    INVERSE,
    PRE_WAIT_FREEZES,
    POST_WAIT_FREEZES,
    ATTACH,
];

/// Returns whether `key` is a node-level field.
pub fn is_other_field_key(key: &str) -> bool {
    OTHER_FIELDS.iter().any(|def| def.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_single;

    #[test]
    fn test_focus_only_in_full_list() {
        assert!(is_other_field_key("focus"));
        assert!(OTHER_FIELDS_WITHOUT_FOCUS.iter().all(|d| d.key != "focus"));
        assert_eq!(OTHER_FIELDS.len(), OTHER_FIELDS_WITHOUT_FOCUS.len() + 1);
    }

    #[test]
    fn test_every_default_coerces() {
        for def in OTHER_FIELDS {
            let value = def.default_value();
            let ok = def.types.iter().any(|ty| match_single(&value, *ty).is_ok());
            assert!(ok, "{} default does not coerce", def.key);
        }
    }
}
