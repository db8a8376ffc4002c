//! Runtime values and the JavaScript conversions between them.

use std::borrow::Cow;
use std::fmt;

use crate::date::DateValue;
use crate::number::{array_index, format_number, string_to_number};
use crate::object::ObjectMap;
use crate::shared::Shared;
use crate::MAX_VALUE_DEPTH;

/// A runtime value.
///
/// Scalars are copied; arrays and objects are shared handles, so a write
/// through one binding is visible through every other binding that refers
/// to the same container.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Elided elements (`[1, , 3]`) are stored as `Undefined`.
    Array(Shared<Vec<Value>>),
    Object(Shared<ObjectMap>),
    Date(DateValue),
    Builtin(Builtin),
}

/// Host functions available in a fresh context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// The `Date` constructor.
    DateConstructor,
    /// `Date.UTC`
    DateUtc,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::DateConstructor => "Date",
            Builtin::DateUtc => "UTC",
        }
    }
}

/// Why a property could not be read or written.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// Reading a property of `undefined` or `null`.
    NullishRead { base: &'static str, key: String },
    /// Writing a property of `undefined` or `null`.
    NullishWrite { base: &'static str, key: String },
    /// Setting an array's `length` to something that is not a valid length.
    InvalidArrayLength,
    /// Growing an array by more slots than the remaining budget allows.
    GrowthLimit { requested: u64 },
}

/// Why an array could not be converted to a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// Arrays nest deeper than [`MAX_VALUE_DEPTH`].
    TooDeep,
    /// The string would cost more than the remaining budget.
    OverBudget,
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullishRead { base, key } => {
                write!(f, "Cannot read properties of {base} (reading '{key}')")
            }
            Self::NullishWrite { base, key } => {
                write!(f, "Cannot set properties of {base} (setting '{key}')")
            }
            Self::InvalidArrayLength => f.write_str("Invalid array length"),
            Self::GrowthLimit { requested } => {
                write!(f, "growing an array by {requested} elements exceeds the gas limit")
            }
        }
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    pub fn object(map: ObjectMap) -> Self {
        Value::Object(Shared::new(map))
    }

    /// The `typeof`-style name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Date(_) => "date",
            Value::Builtin(_) => "function",
        }
    }

    /// JavaScript truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Builtin(_) => true,
        }
    }

    /// Gas to charge for handing out a copy of this value. Containers are
    /// handles; strings are copied.
    pub fn copy_cost(&self) -> u64 {
        match self {
            Value::String(s) => 1 + s.len() as u64 / 16,
            _ => 1,
        }
    }

    /// `ToPrimitive`. Dates become their time value when `prefer_number`
    /// is set and their string form otherwise; arrays and objects always
    /// become strings.
    pub fn to_primitive(&self, prefer_number: bool) -> Cow<'_, Value> {
        match self {
            Value::Date(date) if prefer_number => Cow::Owned(Value::Number(date.time())),
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Builtin(_) => {
                Cow::Owned(Value::String(self.to_js_string()))
            }
            _ => Cow::Borrowed(self),
        }
    }

    /// `ToNumber`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::Date(date) => date.time(),
            Value::Array(_) | Value::Object(_) | Value::Builtin(_) => {
                string_to_number(&self.to_js_string())
            }
        }
    }

    /// `ToString`, without a cost limit. Arrays nested past
    /// [`MAX_VALUE_DEPTH`] convert to the empty string.
    pub fn to_js_string(&self) -> String {
        let mut budget = u64::MAX;
        self.to_js_string_within(&mut budget).unwrap_or_default()
    }

    /// `ToString`, spending one unit of `budget` per array element and per
    /// 16 bytes of output.
    ///
    /// An array met again while it is being joined contributes nothing, as
    /// `Array.prototype.join` does for cycles.
    pub fn to_js_string_within(&self, budget: &mut u64) -> Result<String, ConversionError> {
        let mut out = String::new();
        self.write_js_string(&mut out, budget, 0)?;
        Ok(out)
    }

    fn write_js_string(
        &self,
        out: &mut String,
        budget: &mut u64,
        depth: u32,
    ) -> Result<(), ConversionError> {
        let Value::Array(items) = self else {
            let text = self.scalar_string();
            spend(budget, 1 + text.len() as u64 / 16)?;
            out.push_str(&text);
            return Ok(());
        };
        if depth >= MAX_VALUE_DEPTH {
            return Err(ConversionError::TooDeep);
        }
        let Some(items) = items.try_borrow_mut() else {
            return Ok(());
        };
        for (i, item) in items.iter().enumerate() {
            spend(budget, 1)?;
            if i > 0 {
                out.push(',');
            }
            if !matches!(item, Value::Undefined | Value::Null) {
                item.write_js_string(out, budget, depth + 1)?;
            }
        }
        Ok(())
    }

    /// `ToString` of anything but an array.
    fn scalar_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(_) => String::new(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Date(date) => date.to_date_string(),
            Value::Builtin(builtin) => {
                format!("function {}() {{ [native code] }}", builtin.name())
            }
        }
    }

    // ── Property access ──────────────────────────────────────────────────

    /// Read property `key`. Containers come back as handles to the same
    /// storage.
    pub fn get_property(&self, key: &str) -> Result<Value, PropertyError> {
        let found = match self {
            Value::Undefined | Value::Null => {
                return Err(PropertyError::NullishRead {
                    base: self.type_name(),
                    key: key.to_string(),
                })
            }
            Value::Object(map) => map.borrow().get(key).cloned(),
            Value::Array(items) => {
                let items = items.borrow();
                match key {
                    "length" => Some(Value::Number(items.len() as f64)),
                    _ => array_index(key).and_then(|i| items.get(i as usize)).cloned(),
                }
            }
            Value::String(s) => string_property(s, key),
            Value::Builtin(Builtin::DateConstructor) => match key {
                "UTC" => Some(Value::Builtin(Builtin::DateUtc)),
                "length" => Some(Value::Number(7.0)),
                "name" => Some(Value::String("Date".to_string())),
                _ => None,
            },
            Value::Builtin(Builtin::DateUtc) => match key {
                "length" => Some(Value::Number(7.0)),
                "name" => Some(Value::String("UTC".to_string())),
                _ => None,
            },
            Value::Bool(_) | Value::Number(_) | Value::Date(_) => None,
        };
        Ok(found.unwrap_or(Value::Undefined))
    }

    /// Write property `key` of the container `self` refers to.
    ///
    /// Writes to primitives are ignored, as in sloppy-mode JavaScript; so
    /// are non-index properties of arrays, which JSON output would drop
    /// anyway. Returns how many array slots were added; growth beyond
    /// `max_growth` fails without allocating.
    pub fn set_property(
        &self,
        key: &str,
        value: Value,
        max_growth: u64,
    ) -> Result<u64, PropertyError> {
        match self {
            Value::Undefined | Value::Null => Err(PropertyError::NullishWrite {
                base: self.type_name(),
                key: key.to_string(),
            }),
            Value::Object(map) => {
                map.borrow_mut().insert(key, value);
                Ok(0)
            }
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                if key == "length" {
                    let len = value.to_number();
                    if !(len >= 0.0 && len.fract() == 0.0 && len < 4_294_967_296.0) {
                        return Err(PropertyError::InvalidArrayLength);
                    }
                    return resize(&mut items, len as u64, max_growth);
                }
                let Some(index) = array_index(key) else {
                    return Ok(0);
                };
                let index = u64::from(index);
                let grown = if index >= items.len() as u64 {
                    resize(&mut items, index + 1, max_growth)?
                } else {
                    0
                };
                items[index as usize] = value;
                Ok(grown)
            }
            _ => Ok(0),
        }
    }
}

fn spend(budget: &mut u64, units: u64) -> Result<(), ConversionError> {
    *budget = budget.checked_sub(units).ok_or(ConversionError::OverBudget)?;
    Ok(())
}

/// Resize an array, filling new slots with `Undefined`.
fn resize(items: &mut Vec<Value>, len: u64, max_growth: u64) -> Result<u64, PropertyError> {
    let current = items.len() as u64;
    let grown = len.saturating_sub(current);
    if grown > max_growth {
        return Err(PropertyError::GrowthLimit { requested: grown });
    }
    items.resize(len as usize, Value::Undefined);
    Ok(grown)
}

/// `length` and indexed characters of a string, counted in UTF-16 units.
fn string_property(s: &str, key: &str) -> Option<Value> {
    if key == "length" {
        return Some(Value::Number(s.encode_utf16().count() as f64));
    }
    let index = array_index(key)? as usize;
    let unit = s.encode_utf16().nth(index)?;
    Some(Value::String(String::from_utf16_lossy(&[unit])))
}
