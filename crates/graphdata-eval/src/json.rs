//! JSON serialization with `JSON.stringify(value, null, 4)` semantics.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Number};
use thiserror::Error;

use crate::number::format_number;
use crate::value::Value;
use crate::MAX_VALUE_DEPTH;

/// Largest integer an `f64` holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Output units one conversion may produce: one per value, plus one per
/// 16 bytes of string content.
pub const MAX_JSON_UNITS: u64 = 10_000_000;

#[derive(Debug, Error)]
pub enum JsonError {
    /// The value has no JSON form at all (`undefined`, functions).
    #[error("cannot serialize a value of type {type_name} to JSON")]
    Unserializable { type_name: &'static str },
    #[error("Converting circular structure to JSON")]
    Circular,
    #[error("value nesting exceeds the limit of {} levels", MAX_VALUE_DEPTH)]
    TooDeep,
    /// Shared containers repeat in the output once per reference.
    #[error("JSON output exceeds the limit of {} units", MAX_JSON_UNITS)]
    TooLarge,
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Convert a value to JSON the way `JSON.stringify` does.
///
/// Returns `Ok(None)` for values JSON cannot express; they are dropped
/// from objects and become `null` inside arrays. Non-finite numbers and
/// invalid dates become `null`, valid dates their ISO string. A container
/// that contains itself is an error, as is nesting past
/// [`MAX_VALUE_DEPTH`] or output past [`MAX_JSON_UNITS`].
pub fn to_json(value: &Value) -> Result<Option<serde_json::Value>, JsonError> {
    let mut budget = MAX_JSON_UNITS;
    check(value, 0, &mut budget)?;
    Ok(build(value))
}

/// Walk `value` the way [`build`] will, without allocating, and fail on
/// anything `build` cannot finish.
fn check(value: &Value, depth: u32, budget: &mut u64) -> Result<(), JsonError> {
    *budget = budget.checked_sub(value.copy_cost()).ok_or(JsonError::TooLarge)?;
    match value {
        Value::Array(_) | Value::Object(_) if depth >= MAX_VALUE_DEPTH => {
            return Err(JsonError::TooDeep);
        }
        // Each borrow is held for the walk below it, so meeting the same
        // container again fails.
        Value::Array(items) => {
            let items = items.try_borrow_mut().ok_or(JsonError::Circular)?;
            for item in items.iter() {
                check(item, depth + 1, budget)?;
            }
        }
        Value::Object(map) => {
            let map = map.try_borrow_mut().ok_or(JsonError::Circular)?;
            for item in map.values() {
                check(item, depth + 1, budget)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn build(value: &Value) -> Option<serde_json::Value> {
    let json = match value {
        Value::Undefined | Value::Builtin(_) => return None,
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Date(date) => date
            .to_iso_string()
            .map_or(serde_json::Value::Null, serde_json::Value::String),
        Value::Array(items) => serde_json::Value::Array(
            items
                .borrow()
                .iter()
                .map(|item| build(item).unwrap_or(serde_json::Value::Null))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map.borrow().iter() {
                if let Some(item) = build(item) {
                    out.insert(key, item);
                }
            }
            serde_json::Value::Object(out)
        }
    };
    Some(json)
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        // `-0` prints as `0`.
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Render `value` as JSON indented by four spaces, without a trailing
/// newline.
pub fn to_pretty_json(value: &Value) -> Result<String, JsonError> {
    let json = to_json(value)?.ok_or(JsonError::Unserializable {
        type_name: value.type_name(),
    })?;
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, JsFormatter::new());
    json.serialize(&mut serializer)?;
    // serde_json only ever writes UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Pretty printer that writes floats with JavaScript's number formatting.
struct JsFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl JsFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for JsFormatter<'_> {
    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_number(value).as_bytes())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }
}
