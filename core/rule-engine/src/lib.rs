//! FILENAME: core/rule-engine/src/lib.rs
//! PURPOSE: Main library entry point for the merge rule engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! The span engine depends on `RuleEngine::compare` as its equality test.

pub mod builtins;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod methods;
pub mod types;
pub mod validation;
pub mod value;

// Re-export commonly used types at the crate root
pub use catalog::{
    all_templates, categories, find_template, search_templates, suggest_templates,
    templates_by_category, RuleCategory, RuleTemplate, TemplateExample,
};
pub use config::EngineConfig;
pub use engine::RuleEngine;
pub use error::{EvalError, RuleError};
pub use interpreter::{CustomFunction, ExecutionContext, FunctionRegistry, Interpreter};
pub use types::{
    BatchCaseResult, BatchTestCase, BatchTestReport, Comparison, Equivalence, ExecuteOptions,
    ExecutionRecord, PerformanceStats, RuleExecutionResult, RuleValidation,
};
pub use validation::{complexity_score, BLOCKLIST};
pub use value::RuleValue;
