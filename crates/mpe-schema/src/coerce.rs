//! Coercion of loosely typed document values into declared field types.
//!
//! Imported documents are often hand edited, so numbers arrive as strings and
//! rectangles as `"1,2,3,4"`. [`match_single`] tests one value against one
//! [`FieldType`], and [`match_all`] applies a parameter catalog to a whole map.

use serde_json::{Map, Value};

use crate::field::{FieldDef, FieldType, find_field};
use crate::{CoerceError, TRACING_TARGET_COERCE};

/// Result of coercing a parameter map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coerced {
    /// Coerced parameters, in input order.
    pub params: Map<String, Value>,
    /// Keys whose value matched none of their candidate types.
    pub rejected: Vec<String>,
}

/// Coerces `value` into `ty`.
pub fn match_single(value: &Value, ty: FieldType) -> Result<Value, CoerceError> {
    let coerced = match ty {
        FieldType::Int => to_integer(value).map(Value::from),
        FieldType::Double => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => parse_number(s).map(number_value),
            _ => None,
        },
        FieldType::True => match value {
            Value::Bool(true) => Some(Value::Bool(true)),
            Value::String(s) if s.trim() == "true" => Some(Value::Bool(true)),
            _ => None,
        },
        FieldType::Bool => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        FieldType::String => scalar_string(value).map(Value::String),
        FieldType::IntList => value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| to_integer(item).map(Value::from))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }),
        FieldType::IntListList => int_matrix(value),
        FieldType::DoubleList => value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::Number(_) => Some(item.clone()),
                    Value::String(s) => parse_number(s).map(number_value),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }),
        FieldType::StringList => value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| scalar_string(item).map(Value::String))
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }),
        FieldType::Xywh => int_tuple(value, &[4]),
        FieldType::XywhList => rect_list(value),
        FieldType::PositionList => position_list(value),
        FieldType::IntPair => int_tuple(value, &[2]),
        FieldType::StringPair => string_pair(value),
        FieldType::StringPairList => value.as_array().map(|items| {
            Value::Array(items.iter().filter_map(string_pair).collect())
        }),
        FieldType::Any => Some(match value {
            Value::String(s) => match serde_json::from_str::<Value>(&normalize_quotes(s)) {
                Ok(parsed @ (Value::Object(_) | Value::Array(_))) => parsed,
                _ => value.clone(),
            },
            _ => value.clone(),
        }),
        FieldType::ObjectList => value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::Object(_) => Some(item.clone()),
                    Value::String(s) => parse_object_text(s),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Value::Array)
        }),
    };

    coerced.ok_or_else(|| CoerceError::new(ty, value))
}

/// Coerces every parameter in `params` against the declarations in `defs`.
///
/// Each key tries its candidate types in declaration order and keeps the
/// first success. Keys without a declaration pass through unchanged; keys
/// matching no candidate are dropped and listed in [`Coerced::rejected`].
pub fn match_all(params: &Map<String, Value>, defs: &[FieldDef]) -> Coerced {
    let mut out = Coerced::default();

    for (key, value) in params {
        let Some(def) = find_field(defs, key) else {
            out.params.insert(key.clone(), value.clone());
            continue;
        };

        match def.types.iter().find_map(|ty| match_single(value, *ty).ok()) {
            Some(coerced) => {
                out.params.insert(key.clone(), coerced);
            }
            None => {
                tracing::debug!(
                    target: TRACING_TARGET_COERCE,
                    key = %key,
                    value = %value,
                    "Value matches none of the declared types"
                );
                out.rejected.push(key.clone());
            }
        }
    }

    out
}

/// Parses a trimmed, finite decimal number.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value
        && let Some(i) = n.as_i64()
    {
        return Some(i);
    }
    to_number(value).and_then(integral)
}

fn integral(n: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    (n.fract() == 0.0 && n.abs() <= LIMIT).then_some(n as i64)
}

/// Emits integral numbers as integers.
fn number_value(n: f64) -> Value {
    match integral(n) {
        Some(i) => Value::from(i),
        None => Value::from(n),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Flattens a value into comma-joined text, the way loose list input is
/// usually typed by hand.
fn flat_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(flat_text).collect::<Vec<_>>().join(","),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Splits list-like input into bare segments, ignoring whitespace and brackets.
fn list_segments(value: &Value) -> Vec<String> {
    let text: String = flat_text(value)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '[' && *c != ']')
        .collect();
    text.split([',', '，']).map(str::to_owned).collect()
}

fn parse_ints(value: &Value) -> Option<Vec<i64>> {
    list_segments(value)
        .iter()
        .map(|segment| parse_number(segment).and_then(integral))
        .collect()
}

fn int_tuple(value: &Value, lengths: &[usize]) -> Option<Value> {
    let ints = parse_ints(value)?;
    lengths
        .contains(&ints.len())
        .then(|| Value::from(ints))
}

fn is_bare_tuple(items: &[Value], lengths: &[usize]) -> bool {
    lengths.contains(&items.len()) && items.iter().all(|item| to_integer(item).is_some())
}

fn int_matrix(value: &Value) -> Option<Value> {
    let rows = value.as_array().filter(|rows| !rows.is_empty())?;
    let rows = rows
        .iter()
        .map(parse_ints)
        .collect::<Option<Vec<_>>>()?;

    let width = rows[0].len();
    if rows.iter().any(|row| row.len() != width) {
        return None;
    }
    if width == 1 {
        return Some(Value::from(rows.into_iter().flatten().collect::<Vec<_>>()));
    }
    Some(Value::Array(rows.into_iter().map(Value::from).collect()))
}

fn rect_list(value: &Value) -> Option<Value> {
    let Some(items) = value.as_array() else {
        return int_tuple(value, &[4]).map(|rect| Value::Array(vec![rect]));
    };
    if is_bare_tuple(items, &[4]) {
        return int_tuple(value, &[4]).map(|rect| Value::Array(vec![rect]));
    }
    items
        .iter()
        .map(|item| int_tuple(item, &[4]))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn position_list(value: &Value) -> Option<Value> {
    let items = value.as_array()?;
    if is_bare_tuple(items, &[2, 4]) {
        return int_tuple(value, &[2, 4]).map(|pos| Value::Array(vec![pos]));
    }
    items
        .iter()
        .map(position)
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn position(item: &Value) -> Option<Value> {
    match item {
        Value::Bool(true) => Some(Value::Bool(true)),
        Value::String(s) if s.trim() == "true" => Some(Value::Bool(true)),
        Value::Array(_) => int_tuple(item, &[2, 4]),
        Value::String(s) => Some(int_tuple(item, &[2, 4]).unwrap_or_else(|| Value::String(s.clone()))),
        Value::Number(n) => Some(Value::String(n.to_string())),
        _ => None,
    }
}

fn string_pair(value: &Value) -> Option<Value> {
    if let Value::Array(items) = value
        && items.len() == 2
        && items.iter().all(|item| !item.is_array() && !item.is_object())
    {
        let pair = items.iter().map(scalar_string).collect::<Option<Vec<_>>>()?;
        return Some(Value::from(pair));
    }

    let text: String = flat_text(value)
        .chars()
        .filter(|c| !matches!(c, '"' | ' ' | '[' | ']'))
        .collect();
    let parts: Vec<&str> = text.split(',').collect();
    (parts.len() == 2).then(|| Value::from(parts))
}

fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
}

/// Parses object-looking text, tolerating typographic, escaped and doubled
/// quotes.
fn parse_object_text(text: &str) -> Option<Value> {
    let typographic = normalize_quotes(text);
    let unescaped = typographic.replace("\\\"", "\"");
    let undoubled = unescaped.replace("\"\"", "\"");

    [text, typographic.as_str(), unescaped.as_str(), undoubled.as_str()]
        .into_iter()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(parsed @ Value::Object(_)) => Some(parsed),
            _ => None,
        })
}
