//! FILENAME: core/rule-engine/src/methods.rs
//! PURPOSE: Whitelisted methods and properties on rule values.
//! CONTEXT: `value1.toLowerCase()` and friends. Only the names listed here
//! pass validation, and each one only works on the value types that have it.
//! Character positions count Unicode scalar values.

use crate::error::EvalError;
use crate::value::{format_number, RuleValue, NULL};

/// Method names accepted by validation, across all receiver types.
pub const ALLOWED_METHODS: &[&str] = &[
    "toLowerCase",
    "toUpperCase",
    "toLocaleLowerCase",
    "toLocaleUpperCase",
    "trim",
    "trimStart",
    "trimEnd",
    "includes",
    "startsWith",
    "endsWith",
    "indexOf",
    "split",
    "slice",
    "substring",
    "charAt",
    "replace",
    "toString",
    "join",
    "toFixed",
];

/// Property names accepted by validation.
pub const ALLOWED_PROPERTIES: &[&str] = &["length"];

fn arg(args: &[RuleValue], index: usize) -> &RuleValue {
    args.get(index).unwrap_or(&NULL)
}

/// Integer conversion for position arguments. NaN becomes 0.
fn to_integer(value: &RuleValue) -> f64 {
    let n = value.as_number();
    if n.is_nan() {
        0.0
    } else {
        n.trunc()
    }
}

/// Resolves a possibly negative slice bound against `len`.
fn relative_index(value: &RuleValue, len: usize) -> usize {
    let n = to_integer(value);
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn clamp_index(value: &RuleValue, len: usize) -> usize {
    to_integer(value).clamp(0.0, len as f64) as usize
}

/// Bounds for `slice(start, end)`; an omitted end means the full length.
fn slice_bounds(args: &[RuleValue], len: usize) -> (usize, usize) {
    let start = relative_index(arg(args, 0), len);
    let end = match args.get(1) {
        None | Some(RuleValue::Null) => len,
        Some(value) => relative_index(value, len),
    };
    (start, end.max(start))
}

/// Reads `receiver.property`.
pub fn get_property(receiver: &RuleValue, property: &str) -> Result<RuleValue, EvalError> {
    match (receiver, property) {
        (RuleValue::Null, _) => Err(EvalError::NullAccess(property.to_string())),
        (RuleValue::Text(s), "length") => Ok(RuleValue::Number(s.chars().count() as f64)),
        (RuleValue::Array(items), "length") => Ok(RuleValue::Number(items.len() as f64)),
        _ => Ok(RuleValue::Null),
    }
}

/// Reads `receiver[index]`. Out of range reads yield null.
pub fn get_index(receiver: &RuleValue, index: &RuleValue) -> Result<RuleValue, EvalError> {
    if let RuleValue::Null = receiver {
        return Err(EvalError::NullAccess(index.as_text()));
    }

    let position = index.as_number();
    if position.is_nan() || position < 0.0 || position.fract() != 0.0 {
        return Ok(RuleValue::Null);
    }
    let position = position as usize;

    Ok(match receiver {
        RuleValue::Text(s) => s
            .chars()
            .nth(position)
            .map(|c| RuleValue::Text(c.to_string()))
            .unwrap_or(RuleValue::Null),
        RuleValue::Array(items) => items.get(position).cloned().unwrap_or(RuleValue::Null),
        _ => RuleValue::Null,
    })
}

/// Invokes `receiver.method(args)`.
pub fn call_method(receiver: &RuleValue, method: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    match receiver {
        RuleValue::Null => Err(EvalError::NullAccess(method.to_string())),
        RuleValue::Text(s) => text_method(s, method, args),
        RuleValue::Array(items) => array_method(items, method, args),
        RuleValue::Number(n) => number_method(*n, method, args),
        RuleValue::Boolean(b) => match method {
            "toString" => Ok(RuleValue::Text(b.to_string())),
            _ => Err(not_a_function(receiver, method)),
        },
    }
}

fn not_a_function(receiver: &RuleValue, method: &str) -> EvalError {
    EvalError::NotAFunction {
        type_name: receiver.type_name(),
        method: method.to_string(),
    }
}

// ========================================
// TEXT
// ========================================

fn text_method(s: &str, method: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    let result = match method {
        "toLowerCase" | "toLocaleLowerCase" => RuleValue::Text(s.to_lowercase()),
        "toUpperCase" | "toLocaleUpperCase" => RuleValue::Text(s.to_uppercase()),
        "trim" => RuleValue::Text(s.trim().to_string()),
        "trimStart" => RuleValue::Text(s.trim_start().to_string()),
        "trimEnd" => RuleValue::Text(s.trim_end().to_string()),
        "toString" => RuleValue::Text(s.to_string()),
        "includes" => RuleValue::Boolean(s.contains(arg(args, 0).as_text().as_str())),
        "startsWith" => RuleValue::Boolean(s.starts_with(arg(args, 0).as_text().as_str())),
        "endsWith" => RuleValue::Boolean(s.ends_with(arg(args, 0).as_text().as_str())),
        "indexOf" => {
            let needle = arg(args, 0).as_text();
            let position = s
                .find(needle.as_str())
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0);
            RuleValue::Number(position)
        }
        "split" => RuleValue::Array(split(s, args)),
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(args, chars.len());
            RuleValue::Text(chars[start..end].iter().collect())
        }
        "substring" => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len();
            let start = clamp_index(arg(args, 0), len);
            let end = match args.get(1) {
                None | Some(RuleValue::Null) => len,
                Some(value) => clamp_index(value, len),
            };
            let (from, to) = if start <= end { (start, end) } else { (end, start) };
            RuleValue::Text(chars[from..to].iter().collect())
        }
        "charAt" => {
            let position = to_integer(arg(args, 0));
            let c = if position < 0.0 {
                None
            } else {
                s.chars().nth(position as usize)
            };
            RuleValue::Text(c.map(String::from).unwrap_or_default())
        }
        // Literal pattern, first occurrence only
        "replace" => {
            let pattern = arg(args, 0).as_text();
            let replacement = arg(args, 1).as_text();
            RuleValue::Text(s.replacen(pattern.as_str(), &replacement, 1))
        }
        _ => return Err(EvalError::NotAFunction { type_name: "string", method: method.to_string() }),
    };
    Ok(result)
}

fn split(s: &str, args: &[RuleValue]) -> Vec<RuleValue> {
    match args.first() {
        None | Some(RuleValue::Null) => vec![RuleValue::Text(s.to_string())],
        Some(separator) => {
            let separator = separator.as_text();
            if separator.is_empty() {
                s.chars().map(|c| RuleValue::Text(c.to_string())).collect()
            } else {
                s.split(separator.as_str()).map(RuleValue::from).collect()
            }
        }
    }
}

// ========================================
// ARRAY
// ========================================

/// Membership test used by `includes`: strict equality, except NaN finds NaN.
fn same_value_zero(a: &RuleValue, b: &RuleValue) -> bool {
    match (a, b) {
        (RuleValue::Number(x), RuleValue::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

fn array_method(items: &[RuleValue], method: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    let result = match method {
        "includes" => {
            let needle = arg(args, 0);
            RuleValue::Boolean(items.iter().any(|item| same_value_zero(item, needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            let position = items
                .iter()
                .position(|item| item.strict_equals(needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0);
            RuleValue::Number(position)
        }
        "join" => {
            let separator = match args.first() {
                None | Some(RuleValue::Null) => ",".to_string(),
                Some(value) => value.as_text(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    RuleValue::Null => String::new(),
                    other => other.as_text(),
                })
                .collect();
            RuleValue::Text(parts.join(&separator))
        }
        "slice" => {
            let (start, end) = slice_bounds(args, items.len());
            RuleValue::Array(items[start..end].to_vec())
        }
        "toString" => RuleValue::Text(RuleValue::Array(items.to_vec()).as_text()),
        _ => return Err(EvalError::NotAFunction { type_name: "array", method: method.to_string() }),
    };
    Ok(result)
}

// ========================================
// NUMBER
// ========================================

fn number_method(n: f64, method: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    match method {
        "toString" => Ok(RuleValue::Text(format_number(n))),
        "toFixed" => {
            let digits = to_integer(arg(args, 0));
            if !(0.0..=100.0).contains(&digits) {
                return Err(EvalError::invalid_argument(
                    "toFixed",
                    "digits argument must be between 0 and 100",
                ));
            }
            if !n.is_finite() {
                return Ok(RuleValue::Text(format_number(n)));
            }
            Ok(RuleValue::Text(format!("{:.*}", digits as usize, n)))
        }
        _ => Err(EvalError::NotAFunction { type_name: "number", method: method.to_string() }),
    }
}
