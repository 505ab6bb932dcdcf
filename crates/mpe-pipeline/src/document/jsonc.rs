//! Document text: lenient parsing and four-space pretty printing.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use super::Document;
use crate::{Error, Result};

/// Parses document text, tolerating comments and trailing commas.
///
/// # Errors
///
/// Fails when the text is not JSON after cleanup or the top level is not an
/// object.
pub fn parse_document(text: &str) -> Result<Document> {
    match serde_json::from_str::<Value>(&strip_jsonc(text))? {
        Value::Object(document) => Ok(document),
        other => Err(Error::invalid_document(format!(
            "expected an object at the top level, found {}",
            kind_of(&other)
        ))),
    }
}

/// Serializes `value` indented with four spaces.
///
/// # Errors
///
/// Fails when `value` cannot be represented as JSON.
pub fn to_pretty_string<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(|err| Error::invalid_document(err.to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Removes comments and trailing commas outside string literals.
pub fn strip_jsonc(text: &str) -> String {
    strip_trailing_commas(&strip_comments(text))
}

fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        if in_string {
            match bytes[i] {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match (bytes[i], bytes.get(i + 1)) {
            (b'"', _) => {
                in_string = true;
                i += 1;
            }
            (b'/', Some(b'/')) => {
                out.push_str(&text[copied..i]);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                copied = i;
            }
            (b'/', Some(b'*')) => {
                out.push_str(&text[copied..i]);
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                copied = i;
                out.push(' ');
            }
            _ => i += 1,
        }
    }

    out.push_str(&text[copied.min(text.len())..]);
    out
}

fn strip_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if in_string {
            match byte {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else if byte == b'"' {
            in_string = true;
        } else if byte == b',' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if matches!(bytes.get(j), Some(b'}' | b']')) {
                out.push_str(&text[copied..i]);
                copied = i + 1;
            }
        }
        i += 1;
    }

    out.push_str(&text[copied.min(text.len())..]);
    out
}
