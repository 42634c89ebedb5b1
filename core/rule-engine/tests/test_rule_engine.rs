//! FILENAME: tests/test_rule_engine.rs
//! Integration tests for rule validation, sandboxing, caching and timeouts.

mod common;

use common::{cases, RuleHarness};
use rule_engine::{EngineConfig, Equivalence, ExecuteOptions, RuleValue};
use std::time::Duration;

// ============================================================================
// SAFETY
// ============================================================================

#[test]
fn test_unsafe_rules_are_rejected() {
    let mut harness = RuleHarness::new();
    harness.assert_rejected("window.location");
    harness.assert_rejected("while(true){}");
    harness.assert_rejected("eval('1')");
    harness.assert_rejected("for (;;) {}");
    harness.assert_rejected("do { } while (true)");
    harness.assert_rejected("value1.constructor.constructor('return 1')()");
    harness.assert_rejected("value1.__proto__");
    harness.assert_rejected("Function('return 1')()");
    harness.assert_rejected("fetch('http://example.com')");
    harness.assert_rejected("setTimeout(value1, 0)");
    harness.assert_rejected("globalThis.process");
    harness.assert_rejected("require('fs')");
}

#[test]
fn test_statements_are_rejected() {
    let mut harness = RuleHarness::new();
    harness.assert_rejected("return value1 === value2");
    harness.assert_rejected("value1 = value2");
    harness.assert_rejected("var x = 1; x");
    harness.assert_rejected("new Date(value1)");
    harness.assert_rejected("/abc/.test(value1)");
    harness.assert_rejected("(() => true)()");
}

#[test]
fn test_rejected_rules_never_execute() {
    let mut harness = RuleHarness::new();
    let result = harness.run("window.location", "a", "b");
    assert!(!result.success);
    assert!(!result.result);
    assert!(result.error.is_some());
    assert_eq!(harness.engine.history().count(), 0);
    assert_eq!(harness.engine.cache_len(), 0);
}

// ============================================================================
// EXECUTION
// ============================================================================

#[test]
fn test_values_are_bound_as_text() {
    let mut harness = RuleHarness::new();
    assert!(harness.truth("value1 === '42'", "42", ""));
    assert!(!harness.truth("value1 === 42", "42", ""));
    assert!(harness.truth("Number(value1) === 42", "42", ""));
}

#[test]
fn test_runtime_error_is_reported_not_raised() {
    let mut harness = RuleHarness::new();
    let result = harness.run("value1.split(',')[5].length > 0", "a,b", "");
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Cannot read properties of null (reading 'length')")
    );
}

#[test]
fn test_invalid_regex_is_a_runtime_error() {
    let mut harness = RuleHarness::new();
    let result = harness.run("matches(value1, '(')", "x", "");
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Invalid regular expression"));
}

#[test]
fn test_registered_function_end_to_end() {
    let mut harness = RuleHarness::new();
    harness
        .engine
        .register_function("skuPrefix", |args| {
            let text = args.first().map(|v| v.as_text()).unwrap_or_default();
            Ok(RuleValue::Text(text.split('-').next().unwrap_or("").to_string()))
        })
        .unwrap();

    assert!(harness.truth("skuPrefix(value1) === skuPrefix(value2)", "AB-1", "AB-2"));
    assert!(!harness.truth("skuPrefix(value1) === skuPrefix(value2)", "AB-1", "CD-1"));
}

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn test_cache_correctness() {
    let mut harness = RuleHarness::new();
    let rule = "fuzzyMatch(value1, value2)";

    for (a, b) in [("Jonathan", "Jonathon"), ("apple", "orange"), ("", "x")] {
        let first = harness.run(rule, a, b);
        let second = harness.run(rule, a, b);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.result, second.result);
        assert_eq!(first.error, second.error);
    }

    let stats = harness.engine.performance_stats();
    assert_eq!(stats.cache_hits, 3);
    assert_eq!(stats.cache_size, 3);
}

#[test]
fn test_cache_is_keyed_by_rule_and_both_values() {
    let mut harness = RuleHarness::new();
    harness.run("value1 === value2", "a", "b");
    assert!(!harness.run("value1 === value2", "b", "a").from_cache);
    assert!(!harness.run("value1 == value2", "a", "b").from_cache);
    assert!(harness.run("value1 === value2", "a", "b").from_cache);
}

#[test]
fn test_clear_cache() {
    let mut harness = RuleHarness::new();
    harness.run("value1 === value2", "a", "a");
    harness.engine.clear_cache();
    assert!(!harness.run("value1 === value2", "a", "a").from_cache);
}

// ============================================================================
// TIMEOUT
// ============================================================================

#[test]
fn test_timeout_is_a_recoverable_failure() {
    let mut harness = RuleHarness::with_config(EngineConfig {
        timeout_ms: 5,
        ..EngineConfig::default()
    });
    harness
        .engine
        .register_function("slow", |_| {
            std::thread::sleep(Duration::from_millis(25));
            Ok(RuleValue::Boolean(true))
        })
        .unwrap();

    let result = harness.run("slow() && value1 === value2", "a", "a");
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("timeout"));

    // Timeouts are never served from the cache
    let again = harness.run("slow() && value1 === value2", "a", "a");
    assert!(!again.from_cache);
    assert_eq!(harness.engine.cache_len(), 0);
}

#[test]
fn test_per_call_timeout_overrides_config() {
    let mut harness = RuleHarness::with_slow_function();
    let options = ExecuteOptions {
        timeout: Some(Duration::from_millis(2)),
        ..ExecuteOptions::default()
    };
    let result = harness.engine.execute_with("slow(20)", "", "", options);
    assert_eq!(result.error.as_deref(), Some("timeout"));

    let result = harness.engine.execute("slow(1)", "", "");
    assert!(result.success);
}

// ============================================================================
// BATCH TESTING, EQUIVALENCE, STATISTICS
// ============================================================================

#[test]
fn test_batch_test() {
    let mut harness = RuleHarness::new();
    let report = harness.engine.batch_test(
        "withinPercent(value1, value2, 0.05)",
        &cases(&[("100", "96", true), ("100", "90", false), ("100", "50", true)]),
    );
    assert_eq!(report.total_tests, 3);
    assert_eq!(report.passed_tests, 2);
    assert_eq!(report.failed_tests, 1);
    assert!(report.results[1].passed);
    assert!(!report.results[2].passed);
    assert!(!report.results[2].actual);
}

#[test]
fn test_equivalent_with_custom_rule() {
    let mut harness = RuleHarness::new();
    let rule = Equivalence::Custom("String(value1).trim() === String(value2).trim()".into());
    assert!(harness.engine.equivalent(" Eng", "Eng ", &rule));
    assert!(!harness.engine.equivalent("Eng", "Sales", &rule));
    assert!(!harness.engine.equivalent(" Eng", "Eng ", &Equivalence::Exact));
}

#[test]
fn test_history_records_executions() {
    let mut harness = RuleHarness::new();
    harness.run("value1 === value2", "a", "a");
    harness.run("value1.trim() === value2", "a", "b");

    let history: Vec<_> = harness.engine.history().collect();
    assert_eq!(history.len(), 2);
    assert!(history[0].result);
    assert_eq!(history[1].value2, "b");
    assert!(history[0].timestamp <= history[1].timestamp);

    let stats = harness.engine.performance_stats();
    assert_eq!(stats.total_executions, 2);
    assert_eq!(stats.recent_executions, 2);
    assert!(stats.avg_execution_time_ms >= 0.0);
}

#[test]
fn test_similarity_surface() {
    let harness = RuleHarness::new();
    assert_eq!(harness.engine.similarity("ABC", "abc"), 1.0);
    assert_eq!(harness.engine.similarity("abc", ""), 0.0);
    assert!(harness.engine.similarity("kitten", "sitting") > 0.5);
}
