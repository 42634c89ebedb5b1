//! FILENAME: core/rule-engine/src/validation.rs
//! PURPOSE: Static checks run before any rule is executed.
//! CONTEXT: Three layers, all fail-closed:
//! 1. The rule must parse as a single expression.
//! 2. No identifier token may name something on the blocklist (code
//!    generation, prototype access, ambient globals, timers, network, loops).
//! 3. Every identifier, function, method and property in the AST must be on
//!    the allow-list.
//! The complexity score and length checks only produce warnings.

use crate::builtins;
use crate::config::EngineConfig;
use crate::interpreter::FunctionRegistry;
use crate::methods::{ALLOWED_METHODS, ALLOWED_PROPERTIES};
use crate::types::RuleValidation;
use parser::{tokenize, Expression, Token};

/// Identifier tokens that reject a rule outright.
pub const BLOCKLIST: &[&str] = &[
    "eval",
    "Function",
    "constructor",
    "prototype",
    "__proto__",
    "window",
    "document",
    "global",
    "globalThis",
    "self",
    "process",
    "require",
    "import",
    "fetch",
    "XMLHttpRequest",
    "WebSocket",
    "setTimeout",
    "setInterval",
    "setImmediate",
    "while",
    "for",
    "do",
];

/// The only identifiers a rule may reference.
pub const BOUND_IDENTIFIERS: &[&str] = &["value1", "value2"];

pub fn is_blocklisted(name: &str) -> bool {
    BLOCKLIST.contains(&name)
}

/// A validated rule, with its AST when validation passed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub validation: RuleValidation,
    pub expression: Option<Expression>,
}

fn push_unique(errors: &mut Vec<String>, message: String) {
    if !errors.contains(&message) {
        errors.push(message);
    }
}

/// Weighted count over the token stream: operators +1, calls +2,
/// opening parentheses +1.
pub fn complexity_score(tokens: &[Token]) -> u32 {
    let mut score = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_operator() {
            score += 1;
        }
        match token {
            Token::Identifier(_) if matches!(tokens.get(i + 1), Some(Token::LParen)) => score += 2,
            Token::LParen => score += 1,
            _ => {}
        }
    }
    score
}

/// Runs every check and keeps the AST for execution.
pub fn compile(rule: &str, config: &EngineConfig, functions: &FunctionRegistry) -> CompiledRule {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if rule.trim().is_empty() {
        errors.push("Rule must not be empty".to_string());
        return CompiledRule {
            validation: RuleValidation {
                valid: false,
                errors,
                warnings,
                complexity_score: 0,
            },
            expression: None,
        };
    }

    let tokens = tokenize(rule);

    // 1. Syntax
    let parsed = match parser::parse(rule) {
        Ok(expr) => Some(expr),
        Err(e) => {
            errors.push(format!("Syntax error: {}", e.message));
            None
        }
    };

    // 2. Blocklist
    for token in &tokens {
        if let Token::Identifier(name) = token {
            if is_blocklisted(name) {
                push_unique(&mut errors, format!("Forbidden identifier: {}", name));
            }
        }
    }

    // 3. Allow-list
    if let Some(expr) = &parsed {
        check_allowed(expr, functions, &mut errors);
    }

    let complexity = complexity_score(&tokens);
    if rule.chars().count() > config.max_rule_length {
        warnings.push(format!(
            "Rule is longer than {} characters and may be slow",
            config.max_rule_length
        ));
    }
    if complexity > config.complexity_threshold {
        warnings.push(format!(
            "Rule complexity {} exceeds {}, consider simplifying it",
            complexity, config.complexity_threshold
        ));
    }

    let valid = errors.is_empty();
    CompiledRule {
        validation: RuleValidation {
            valid,
            errors,
            warnings,
            complexity_score: complexity,
        },
        expression: if valid { parsed } else { None },
    }
}

fn check_allowed(expr: &Expression, functions: &FunctionRegistry, errors: &mut Vec<String>) {
    expr.walk(&mut |node| match node {
        Expression::Identifier(name) => {
            // Blocklisted names were already reported
            if !BOUND_IDENTIFIERS.contains(&name.as_str()) && !is_blocklisted(name) {
                push_unique(
                    errors,
                    format!("Unknown identifier: {} (only value1 and value2 are available)", name),
                );
            }
        }
        Expression::FunctionCall { name, .. } => {
            if !builtins::is_builtin(name) && !functions.contains_key(name) && !is_blocklisted(name) {
                push_unique(errors, format!("Unknown function: {}", name));
            }
        }
        Expression::MethodCall { method, .. } => {
            if !ALLOWED_METHODS.contains(&method.as_str()) && !is_blocklisted(method) {
                push_unique(errors, format!("Method not allowed: {}", method));
            }
        }
        Expression::Member { property, .. } => {
            if !ALLOWED_PROPERTIES.contains(&property.as_str()) && !is_blocklisted(property) {
                push_unique(errors, format!("Property not allowed: {}", property));
            }
        }
        _ => {}
    });
}
