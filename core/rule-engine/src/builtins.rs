//! FILENAME: core/rule-engine/src/builtins.rs
//! PURPOSE: The allow-listed free functions a rule may call.
//! CONTEXT: These exist so rule authors can say "same enough" without loops,
//! which the grammar does not have. Every function is pure. Missing arguments
//! read as null, the way a script function sees an omitted parameter.
//!
//! FUNCTIONS:
//! - Conversion: String, Number, Boolean, parseNum, parseStr
//! - Predicates: isEmpty, isNumber, isDate, isInRange, matches
//! - Text: similarity, fuzzyMatch, extractNumbers, extractWords
//! - Numbers: roundTo, percentDiff, withinPercent, Math.*, Number.*
//! - Dates: sameDate, isSameWeek, getQuarter, dateDiffDays
//! - Sets: hasCommonElement, arrayIntersection

use crate::dates::{self, Granularity};
use crate::error::EvalError;
use crate::value::{round_half_up, RuleValue, NULL};
use regex::Regex;

/// Every name `call` understands.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "String",
    "Number",
    "Boolean",
    "isEmpty",
    "isNumber",
    "isDate",
    "parseNum",
    "parseStr",
    "similarity",
    "fuzzyMatch",
    "extractNumbers",
    "extractWords",
    "matches",
    "isInRange",
    "roundTo",
    "percentDiff",
    "withinPercent",
    "sameDate",
    "isSameWeek",
    "getQuarter",
    "dateDiffDays",
    "hasCommonElement",
    "arrayIntersection",
    "Math.abs",
    "Math.min",
    "Math.max",
    "Math.round",
    "Math.floor",
    "Math.ceil",
    "Math.trunc",
    "Math.sign",
    "Math.sqrt",
    "Math.pow",
    "Math.log10",
    "Number.isNaN",
    "Number.isFinite",
    "Number.isInteger",
];

/// Default threshold for `fuzzyMatch`.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

/// Word characters in the regular-expression sense: ASCII letters, digits and `_`.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_FUNCTIONS.contains(&name)
}

fn arg(args: &[RuleValue], index: usize) -> &RuleValue {
    args.get(index).unwrap_or(&NULL)
}

/// Numeric argument with a default for when it was omitted.
fn number_or(args: &[RuleValue], index: usize, default: f64) -> f64 {
    match args.get(index) {
        None | Some(RuleValue::Null) => default,
        Some(value) => value.as_number(),
    }
}

/// Dispatches a built-in by name.
pub fn call(name: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    let result = match name {
        // Conversion
        "String" => RuleValue::Text(args.first().map(|v| v.as_text()).unwrap_or_default()),
        "Number" => RuleValue::Number(args.first().map(|v| v.as_number()).unwrap_or(0.0)),
        "Boolean" => RuleValue::Boolean(arg(args, 0).truthy()),
        "parseNum" => {
            let n = arg(args, 0).as_number();
            RuleValue::Number(if n.is_nan() { 0.0 } else { n })
        }
        "parseStr" => match arg(args, 0) {
            RuleValue::Null => RuleValue::Text(String::new()),
            other => RuleValue::Text(other.as_text()),
        },

        // Predicates
        "isEmpty" => RuleValue::Boolean(match arg(args, 0) {
            RuleValue::Null => true,
            RuleValue::Text(s) => s.is_empty(),
            _ => false,
        }),
        "isNumber" => RuleValue::Boolean(is_numeric(arg(args, 0))),
        "isDate" => RuleValue::Boolean(as_date(arg(args, 0)).is_some()),
        "isInRange" => {
            let n = arg(args, 0).as_number();
            let min = arg(args, 1).as_number();
            let max = arg(args, 2).as_number();
            RuleValue::Boolean(n >= min && n <= max)
        }
        "matches" => fn_matches(args)?,

        // Text
        "similarity" => RuleValue::Number(similarity(&arg(args, 0).as_text(), &arg(args, 1).as_text())),
        "fuzzyMatch" => {
            let threshold = number_or(args, 2, DEFAULT_FUZZY_THRESHOLD);
            let score = similarity(&arg(args, 0).as_text(), &arg(args, 1).as_text());
            RuleValue::Boolean(score >= threshold)
        }
        "extractNumbers" => {
            let text = arg(args, 0).as_text();
            RuleValue::Array(
                text.split(|c: char| !c.is_ascii_digit())
                    .filter(|run| !run.is_empty())
                    .map(|run| RuleValue::Number(crate::value::parse_number(run)))
                    .collect(),
            )
        }
        "extractWords" => {
            let text = arg(args, 0).as_text();
            RuleValue::Array(
                text.split(|c: char| !is_word_char(c))
                    .filter(|word| !word.is_empty())
                    .map(RuleValue::from)
                    .collect(),
            )
        }

        // Numbers
        "roundTo" => {
            let factor = 10f64.powf(number_or(args, 1, 2.0));
            RuleValue::Number(round_half_up(arg(args, 0).as_number() * factor) / factor)
        }
        "percentDiff" => RuleValue::Number(percent_diff(arg(args, 0).as_number(), arg(args, 1).as_number())),
        "withinPercent" => {
            let diff = percent_diff(arg(args, 0).as_number(), arg(args, 1).as_number());
            RuleValue::Boolean(diff <= arg(args, 2).as_number())
        }

        // Dates
        "sameDate" => {
            let granularity = match args.get(2) {
                None | Some(RuleValue::Null) => Granularity::Day,
                Some(value) => {
                    let name = value.as_text();
                    Granularity::parse(&name).ok_or_else(|| {
                        EvalError::invalid_argument("sameDate", format!("unknown granularity '{}'", name))
                    })?
                }
            };
            RuleValue::Boolean(same_date(arg(args, 0), arg(args, 1), granularity))
        }
        "isSameWeek" => RuleValue::Boolean(same_date(arg(args, 0), arg(args, 1), Granularity::Week)),
        "getQuarter" => RuleValue::Number(
            as_date(arg(args, 0))
                .map(|date| dates::quarter(&date) as f64)
                .unwrap_or(f64::NAN),
        ),
        "dateDiffDays" => RuleValue::Number(
            match (as_date(arg(args, 0)), as_date(arg(args, 1))) {
                (Some(a), Some(b)) => dates::diff_days(&a, &b),
                _ => f64::NAN,
            },
        ),

        // Sets
        "hasCommonElement" => {
            let right = arg(args, 1).as_list();
            RuleValue::Boolean(arg(args, 0).as_list().iter().any(|item| right.contains(item)))
        }
        "arrayIntersection" => {
            let right = arg(args, 1).as_list();
            let mut shared: Vec<String> = Vec::new();
            for item in arg(args, 0).as_list() {
                if right.contains(&item) && !shared.contains(&item) {
                    shared.push(item);
                }
            }
            RuleValue::Array(shared.into_iter().map(RuleValue::Text).collect())
        }

        // Math
        "Math.abs" => unary_math(args, f64::abs),
        "Math.round" => unary_math(args, round_half_up),
        "Math.floor" => unary_math(args, f64::floor),
        "Math.ceil" => unary_math(args, f64::ceil),
        "Math.trunc" => unary_math(args, f64::trunc),
        "Math.sqrt" => unary_math(args, f64::sqrt),
        "Math.log10" => unary_math(args, f64::log10),
        "Math.sign" => unary_math(args, |n| {
            if n.is_nan() || n == 0.0 {
                n
            } else {
                n.signum()
            }
        }),
        "Math.pow" => RuleValue::Number(arg(args, 0).as_number().powf(arg(args, 1).as_number())),
        "Math.min" => RuleValue::Number(fold_numbers(args, f64::INFINITY, f64::min)),
        "Math.max" => RuleValue::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)),

        // Number predicates do not coerce
        "Number.isNaN" => RuleValue::Boolean(matches!(arg(args, 0), RuleValue::Number(n) if n.is_nan())),
        "Number.isFinite" => {
            RuleValue::Boolean(matches!(arg(args, 0), RuleValue::Number(n) if n.is_finite()))
        }
        "Number.isInteger" => RuleValue::Boolean(
            matches!(arg(args, 0), RuleValue::Number(n) if n.is_finite() && n.fract() == 0.0),
        ),

        _ => return Err(EvalError::UnknownFunction(name.to_string())),
    };

    Ok(result)
}

fn unary_math(args: &[RuleValue], op: impl Fn(f64) -> f64) -> RuleValue {
    RuleValue::Number(op(arg(args, 0).as_number()))
}

/// min/max over all arguments. Any NaN poisons the result.
fn fold_numbers(args: &[RuleValue], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.as_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn fn_matches(args: &[RuleValue]) -> Result<RuleValue, EvalError> {
    let pattern = arg(args, 1).as_text();
    let regex = Regex::new(&pattern).map_err(|e| EvalError::InvalidPattern(e.to_string()))?;
    Ok(RuleValue::Boolean(regex.is_match(&arg(args, 0).as_text())))
}

/// Numeric-coercible and finite. Blank text does not count as a number.
pub fn is_numeric(value: &RuleValue) -> bool {
    match value {
        RuleValue::Text(s) if s.trim().is_empty() => false,
        RuleValue::Null | RuleValue::Array(_) => false,
        other => other.as_number().is_finite(),
    }
}

fn as_date(value: &RuleValue) -> Option<chrono::NaiveDateTime> {
    match value {
        RuleValue::Text(s) => dates::parse_date(s),
        _ => None,
    }
}

fn same_date(a: &RuleValue, b: &RuleValue, granularity: Granularity) -> bool {
    match (as_date(a), as_date(b)) {
        (Some(a), Some(b)) => dates::same_period(&a, &b, granularity),
        _ => false,
    }
}

/// |a - b| relative to the larger magnitude. Two zeros differ by 0.
pub fn percent_diff(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Case-insensitive normalized edit distance similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 1.0;
    }

    let longest = a.chars().count().max(b.chars().count());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    (longest - distance) as f64 / longest as f64
}
