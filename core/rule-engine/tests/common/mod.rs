//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for rule engine integration tests.

#![allow(dead_code)]

use rule_engine::{BatchTestCase, EngineConfig, RuleEngine, RuleExecutionResult, RuleValue};
use std::time::Duration;

/// Wraps an engine with shorthand for the common assertions.
pub struct RuleHarness {
    pub engine: RuleEngine,
}

impl RuleHarness {
    pub fn new() -> Self {
        RuleHarness {
            engine: RuleEngine::new(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        RuleHarness {
            engine: RuleEngine::with_config(config),
        }
    }

    /// An engine with a `slow(ms)` function that sleeps before returning true.
    pub fn with_slow_function() -> Self {
        let mut harness = Self::new();
        harness
            .engine
            .register_function("slow", |args| {
                let ms = args.first().map(|v| v.as_number()).unwrap_or(0.0);
                std::thread::sleep(Duration::from_millis(ms as u64));
                Ok(RuleValue::Boolean(true))
            })
            .unwrap();
        harness
    }

    pub fn run(&mut self, rule: &str, value1: &str, value2: &str) -> RuleExecutionResult {
        self.engine.execute(rule, value1, value2)
    }

    /// Asserts the rule executes successfully and returns its boolean.
    pub fn truth(&mut self, rule: &str, value1: &str, value2: &str) -> bool {
        let result = self.run(rule, value1, value2);
        assert!(
            result.success,
            "rule '{}' failed on ({:?}, {:?}): {:?}",
            rule, value1, value2, result.error
        );
        result.result
    }

    pub fn assert_rejected(&mut self, rule: &str) {
        let validation = self.engine.validate(rule);
        assert!(!validation.valid, "rule '{}' should be rejected", rule);
        assert!(!validation.errors.is_empty());
    }
}

/// Shorthand for a list of batch cases.
pub fn cases(items: &[(&str, &str, bool)]) -> Vec<BatchTestCase> {
    items
        .iter()
        .map(|&(a, b, expected)| BatchTestCase::new(a, b, expected))
        .collect()
}
