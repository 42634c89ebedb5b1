//! FILENAME: core/rule-engine/src/engine.rs
//! PURPOSE: The caller-owned rule engine: validation, cached and timed
//! execution, function registration, batch testing and statistics.
//! CONTEXT: The span engine calls `compare` once per adjacent cell pair, so
//! the same (rule, value1, value2) triple is evaluated many times during one
//! render. Validation is memoized per rule text and results are cached per
//! triple. Nothing here panics on bad rules or bad data; failures come back
//! as `success = false` results.

use crate::builtins;
use crate::catalog::{self, RuleTemplate};
use crate::config::EngineConfig;
use crate::error::RuleError;
use crate::interpreter::{CustomFunction, ExecutionContext, FunctionRegistry, Interpreter};
use crate::types::{
    BatchCaseResult, BatchTestCase, BatchTestReport, Comparison, Equivalence, ExecuteOptions,
    ExecutionRecord, PerformanceStats, RuleExecutionResult, RuleValidation,
};
use crate::validation::{self, CompiledRule, BOUND_IDENTIFIERS};
use crate::value::{round_half_up, RuleValue};
use chrono::Utc;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

const LOG_TARGET: &str = "rules";

/// Literal keywords of the rule grammar. They can never name a function.
const KEYWORDS: &[&str] = &["true", "false", "null", "undefined"];

type CacheKey = (String, String, String);

/// Validates and executes custom equivalence rules.
pub struct RuleEngine {
    config: EngineConfig,
    functions: FunctionRegistry,
    compiled: FxHashMap<String, Arc<CompiledRule>>,
    cache: FxHashMap<CacheKey, RuleExecutionResult>,
    history: VecDeque<ExecutionRecord>,
    total_executions: usize,
    cache_hits: u64,
    cache_lookups: u64,
    debug: bool,
}

impl Default for RuleEngine {
    fn default() -> Self {
        RuleEngine::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        RuleEngine::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        RuleEngine {
            config,
            functions: FunctionRegistry::default(),
            compiled: FxHashMap::default(),
            cache: FxHashMap::default(),
            history: VecDeque::new(),
            total_executions: 0,
            cache_hits: 0,
            cache_lookups: 0,
            debug: false,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ========================================
    // VALIDATION
    // ========================================

    /// Checks a rule without executing it.
    pub fn validate(&mut self, rule: &str) -> RuleValidation {
        self.compile(rule).validation.clone()
    }

    fn compile(&mut self, rule: &str) -> Arc<CompiledRule> {
        if let Some(compiled) = self.compiled.get(rule) {
            return Arc::clone(compiled);
        }

        let compiled = Arc::new(validation::compile(rule, &self.config, &self.functions));
        if !compiled.validation.valid {
            log::debug!(target: LOG_TARGET, "Rule rejected: {:?}", compiled.validation.errors);
        }
        self.compiled.insert(rule.to_string(), Arc::clone(&compiled));
        compiled
    }

    // ========================================
    // EXECUTION
    // ========================================

    /// Executes a rule with default options.
    pub fn execute(&mut self, rule: &str, value1: &str, value2: &str) -> RuleExecutionResult {
        self.execute_with(rule, value1, value2, ExecuteOptions::default())
    }

    /// Executes a rule. Always returns a result; invalid rules are never run.
    pub fn execute_with(
        &mut self,
        rule: &str,
        value1: &str,
        value2: &str,
        options: ExecuteOptions,
    ) -> RuleExecutionResult {
        let start = Instant::now();

        let compiled = self.compile(rule);
        let validation = &compiled.validation;
        let expression = match (&compiled.expression, validation.first_error()) {
            (Some(expression), None) => expression,
            (_, error) => {
                let error = error.unwrap_or("Rule failed validation").to_string();
                return RuleExecutionResult::failure(
                    error,
                    validation.warnings.clone(),
                    validation.complexity_score,
                );
            }
        };

        let use_cache = self.config.cache_enabled && options.enable_cache;
        let key: CacheKey = (rule.to_string(), value1.to_string(), value2.to_string());

        if use_cache {
            self.cache_lookups += 1;
            if let Some(cached) = self.cache.get(&key) {
                self.cache_hits += 1;
                log::trace!(target: LOG_TARGET, "Cache hit for {:?}", key);
                return RuleExecutionResult {
                    from_cache: true,
                    ..cached.clone()
                };
            }
        }

        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let outcome = {
            let context = ExecutionContext::new(value1, value2, &self.functions);
            Interpreter::new(&context)
                .with_deadline(start + timeout)
                .run(expression)
        };
        let execution_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let (result, cacheable) = match outcome {
            Ok(matched) => (
                RuleExecutionResult {
                    success: true,
                    result: matched,
                    error: None,
                    warnings: validation.warnings.clone(),
                    execution_time_ms,
                    complexity_score: validation.complexity_score,
                    from_cache: false,
                },
                true,
            ),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Rule '{}' failed on ({:?}, {:?}): {}", rule, value1, value2, e);
                (
                    RuleExecutionResult {
                        execution_time_ms,
                        ..RuleExecutionResult::failure(
                            e.to_string(),
                            validation.warnings.clone(),
                            validation.complexity_score,
                        )
                    },
                    e.is_deterministic(),
                )
            }
        };

        if self.debug {
            log::debug!(
                target: LOG_TARGET,
                "execute '{}' ({:?}, {:?}) -> success={} result={} in {:.3}ms",
                rule,
                value1,
                value2,
                result.success,
                result.result,
                execution_time_ms
            );
        }

        if use_cache && cacheable {
            self.cache.insert(key, result.clone());
        }
        self.record(rule, value1, value2, &result);

        result
    }

    fn record(&mut self, rule: &str, value1: &str, value2: &str, result: &RuleExecutionResult) {
        self.total_executions += 1;
        self.history.push_back(ExecutionRecord {
            rule: rule.to_string(),
            value1: value1.to_string(),
            value2: value2.to_string(),
            success: result.success,
            result: result.result,
            timestamp: Utc::now(),
            execution_time_ms: result.execution_time_ms,
        });

        if let Some(capacity) = self.config.history_capacity {
            while self.history.len() > capacity {
                self.history.pop_front();
            }
        }
    }

    // ========================================
    // EQUIVALENCE
    // ========================================

    /// The equality test used by span computation.
    pub fn equivalent(&mut self, value1: &str, value2: &str, equivalence: &Equivalence) -> bool {
        self.compare(value1, value2, equivalence).matched
    }

    /// Like `equivalent`, but reports when a failing custom rule fell back
    /// to exact equality.
    pub fn compare(&mut self, value1: &str, value2: &str, equivalence: &Equivalence) -> Comparison {
        match equivalence {
            Equivalence::Exact => Comparison {
                matched: value1 == value2,
                fallback: None,
            },
            Equivalence::Custom(rule) => {
                let outcome = self.execute(rule, value1, value2);
                if outcome.success {
                    Comparison {
                        matched: outcome.result,
                        fallback: None,
                    }
                } else {
                    let reason = outcome.error.unwrap_or_default();
                    Comparison {
                        matched: value1 == value2,
                        fallback: Some(format!(
                            "Custom rule failed ({}), exact equality was used instead",
                            reason
                        )),
                    }
                }
            }
        }
    }

    // ========================================
    // FUNCTIONS
    // ========================================

    /// Makes a host function callable from rules executed after this call.
    pub fn register_function<F>(&mut self, name: &str, function: F) -> Result<(), RuleError>
    where
        F: Fn(&[RuleValue]) -> Result<RuleValue, String> + Send + Sync + 'static,
    {
        if !is_identifier(name) {
            return Err(RuleError::InvalidFunctionName(name.to_string()));
        }
        if validation::is_blocklisted(name)
            || builtins::is_builtin(name)
            || BOUND_IDENTIFIERS.contains(&name)
            || KEYWORDS.contains(&name)
            || parser::NAMESPACES.contains(&name)
        {
            return Err(RuleError::ReservedName(name.to_string()));
        }

        let function: CustomFunction = Arc::new(function);
        self.functions.insert(name.to_string(), function);

        // Validation and results may depend on which functions exist
        self.compiled.clear();
        self.clear_cache();

        log::debug!(target: LOG_TARGET, "Registered rule function '{}'", name);
        Ok(())
    }

    pub fn has_function(&self, name: &str) -> bool {
        builtins::is_builtin(name) || self.functions.contains_key(name)
    }

    // ========================================
    // TESTING AND SUGGESTIONS
    // ========================================

    /// Runs a rule over test cases and compares against the expected outcome.
    pub fn batch_test(&mut self, rule: &str, cases: &[BatchTestCase]) -> BatchTestReport {
        let results: Vec<BatchCaseResult> = cases
            .iter()
            .map(|case| {
                let outcome = self.execute(rule, &case.value1, &case.value2);
                BatchCaseResult {
                    case: case.clone(),
                    actual: outcome.result,
                    passed: outcome.success && outcome.result == case.expected,
                    error: outcome.error,
                    execution_time_ms: outcome.execution_time_ms,
                }
            })
            .collect();

        let total_tests = results.len();
        let passed_tests = results.iter().filter(|r| r.passed).count();
        BatchTestReport {
            total_tests,
            passed_tests,
            failed_tests: total_tests - passed_tests,
            pass_rate: if total_tests == 0 {
                0.0
            } else {
                passed_tests as f64 / total_tests as f64
            },
            results,
        }
    }

    /// Catalog templates that fit the given sample values.
    pub fn suggest<S: AsRef<str>>(&self, samples: &[S]) -> Vec<&'static RuleTemplate> {
        catalog::suggest_templates(samples)
    }

    /// Normalized, case-insensitive edit-distance similarity.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        builtins::similarity(a, b)
    }

    // ========================================
    // STATISTICS AND HOUSEKEEPING
    // ========================================

    pub fn performance_stats(&self) -> PerformanceStats {
        let window = self.config.stats_window.min(self.history.len());
        let recent = self.history.iter().skip(self.history.len() - window);
        let avg = if window == 0 {
            0.0
        } else {
            recent.map(|record| record.execution_time_ms).sum::<f64>() / window as f64
        };

        PerformanceStats {
            avg_execution_time_ms: round_half_up(avg * 100.0) / 100.0,
            total_executions: self.total_executions,
            recent_executions: window,
            cache_size: self.cache.len(),
            cache_hits: self.cache_hits,
            cache_hit_rate: if self.cache_lookups == 0 {
                0.0
            } else {
                self.cache_hits as f64 / self.cache_lookups as f64
            },
        }
    }

    /// Executions in order, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.history.iter()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.total_executions = 0;
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_hits = 0;
        self.cache_lookups = 0;
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Debug mode logs every execution at debug level.
    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
