//! FILENAME: core/rule-engine/src/types.rs
//! PURPOSE: Request and result types shared by the rule engine's public API.
//! CONTEXT: Everything crossing the API boundary serializes to camelCase JSON
//! so a configuration front-end can consume it without a mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of `RuleEngine::validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub complexity_score: u32,
}

impl RuleValidation {
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

/// Outcome of one rule execution. Cached copies carry `from_cache = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecutionResult {
    pub success: bool,
    pub result: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub execution_time_ms: f64,
    pub complexity_score: u32,
    pub from_cache: bool,
}

impl RuleExecutionResult {
    pub(crate) fn failure(error: String, warnings: Vec<String>, complexity_score: u32) -> Self {
        RuleExecutionResult {
            success: false,
            result: false,
            error: Some(error),
            warnings,
            execution_time_ms: 0.0,
            complexity_score,
            from_cache: false,
        }
    }
}

/// Per-call execution options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecuteOptions {
    /// Overrides the engine's configured timeout.
    pub timeout: Option<Duration>,
    /// When false the result is neither read from nor written to the cache.
    pub enable_cache: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        ExecuteOptions {
            timeout: None,
            enable_cache: true,
        }
    }
}

/// The equality test used when computing spans.
///
/// Serialized as `{"condition": "same"}` or
/// `{"condition": "custom", "rule": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "condition", content = "rule", rename_all = "camelCase")]
pub enum Equivalence {
    /// Plain string equality of the normalized values.
    #[default]
    #[serde(rename = "same")]
    Exact,
    /// A user-authored rule expression.
    Custom(String),
}

/// Result of `RuleEngine::compare`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub matched: bool,
    /// Set when the custom rule failed and exact equality decided instead.
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestCase {
    pub value1: String,
    pub value2: String,
    pub expected: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl BatchTestCase {
    pub fn new(value1: impl Into<String>, value2: impl Into<String>, expected: bool) -> Self {
        BatchTestCase {
            value1: value1.into(),
            value2: value2.into(),
            expected,
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCaseResult {
    #[serde(flatten)]
    pub case: BatchTestCase,
    pub actual: bool,
    pub passed: bool,
    pub error: Option<String>,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTestReport {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    /// passed / total, or 0 for an empty batch.
    pub pass_rate: f64,
    pub results: Vec<BatchCaseResult>,
}

/// One entry of the engine's execution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub rule: String,
    pub value1: String,
    pub value2: String,
    pub success: bool,
    pub result: bool,
    pub timestamp: DateTime<Utc>,
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    /// Mean over the recent window, rounded to two decimals.
    pub avg_execution_time_ms: f64,
    pub total_executions: usize,
    pub recent_executions: usize,
    pub cache_size: usize,
    pub cache_hits: u64,
    pub cache_hit_rate: f64,
}
