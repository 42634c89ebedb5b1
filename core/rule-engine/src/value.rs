//! FILENAME: core/rule-engine/src/value.rs
//! PURPOSE: Runtime values produced while interpreting a rule.
//! CONTEXT: Rules are written with script-like syntax, so the coercions here
//! follow the familiar loose rules: text that looks numeric compares as a
//! number, empty text is falsy, `+` concatenates as soon as text is involved.

use serde::{Deserialize, Serialize};

/// A value flowing through the rule interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Array(Vec<RuleValue>),
}

pub(crate) static NULL: RuleValue = RuleValue::Null;

impl RuleValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuleValue::Null => "null",
            RuleValue::Boolean(_) => "boolean",
            RuleValue::Number(_) => "number",
            RuleValue::Text(_) => "string",
            RuleValue::Array(_) => "array",
        }
    }

    /// Truthiness used by `!`, `&&`, `||`, `?:` and the final boolean result.
    pub fn truthy(&self) -> bool {
        match self {
            RuleValue::Null => false,
            RuleValue::Boolean(b) => *b,
            RuleValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RuleValue::Text(s) => !s.is_empty(),
            RuleValue::Array(_) => true,
        }
    }

    /// Numeric coercion. Failure yields NaN rather than an error.
    pub fn as_number(&self) -> f64 {
        match self {
            RuleValue::Null => 0.0,
            RuleValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RuleValue::Number(n) => *n,
            RuleValue::Text(s) => parse_number(s),
            RuleValue::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.as_number(),
                _ => f64::NAN,
            },
        }
    }

    /// String coercion.
    pub fn as_text(&self) -> String {
        match self {
            RuleValue::Null => "null".to_string(),
            RuleValue::Boolean(b) => b.to_string(),
            RuleValue::Number(n) => format_number(*n),
            RuleValue::Text(s) => s.clone(),
            RuleValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    RuleValue::Null => String::new(),
                    other => other.as_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// `===`: same type and same value. NaN never equals itself.
    pub fn strict_equals(&self, other: &RuleValue) -> bool {
        match (self, other) {
            (RuleValue::Null, RuleValue::Null) => true,
            (RuleValue::Boolean(a), RuleValue::Boolean(b)) => a == b,
            (RuleValue::Number(a), RuleValue::Number(b)) => a == b,
            (RuleValue::Text(a), RuleValue::Text(b)) => a == b,
            (RuleValue::Array(a), RuleValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_equals(y))
            }
            _ => false,
        }
    }

    /// `==`: numeric coercion across types, null only equals null.
    pub fn loose_equals(&self, other: &RuleValue) -> bool {
        match (self, other) {
            (RuleValue::Null, _) | (_, RuleValue::Null) => {
                matches!((self, other), (RuleValue::Null, RuleValue::Null))
            }
            (RuleValue::Text(a), RuleValue::Text(b)) => a == b,
            (RuleValue::Array(_), RuleValue::Array(_)) => self.strict_equals(other),
            (RuleValue::Array(_), _) | (_, RuleValue::Array(_)) => self.as_text() == other.as_text(),
            _ => self.as_number() == other.as_number(),
        }
    }

    /// Items for the set helpers: arrays as-is, anything else split on commas.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            RuleValue::Array(items) => items.iter().map(|item| item.as_text()).collect(),
            RuleValue::Null => Vec::new(),
            other => other
                .as_text()
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
        }
    }
}

impl From<&str> for RuleValue {
    fn from(value: &str) -> Self {
        RuleValue::Text(value.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(value: String) -> Self {
        RuleValue::Text(value)
    }
}

impl From<f64> for RuleValue {
    fn from(value: f64) -> Self {
        RuleValue::Number(value)
    }
}

impl From<bool> for RuleValue {
    fn from(value: bool) -> Self {
        RuleValue::Boolean(value)
    }
}

/// Parses text the way numeric coercion expects: surrounding whitespace is
/// ignored, blank text is zero, and words like "nan" or "inf" are not numbers.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    match trimmed {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            let has_letters = trimmed
                .chars()
                .any(|c| c.is_alphabetic() && c != 'e' && c != 'E');
            if has_letters {
                f64::NAN
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
    }
}

/// Formats a number without a trailing ".0" for whole values.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Also folds -0 into "0"
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Rounds half-way cases up, towards positive infinity.
pub fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}
