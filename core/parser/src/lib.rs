//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the merge rule expression parser.
//! CONTEXT: This crate turns the text of a custom merge rule into an
//! expression tree that the rule engine interprets. Nothing here executes
//! anything; a rule that parses is only a candidate for evaluation.
//!
//! PIPELINE: Rule Text --> Lexer --> Tokens --> Parser --> AST --> Interpreter
//!
//! SUPPORTED FEATURES:
//! - Literals: numbers, 'single' or "double" quoted strings, true, false, null
//! - Array literals: ["High", "Urgent"]
//! - Identifiers: value1, value2 (anything else is rejected downstream)
//! - Function calls: fuzzyMatch(value1, value2, 0.8), Math.abs(x)
//! - Member access and method calls: value1.length, value1.trim()
//! - Indexing: value1.split("-")[0]
//! - Operators: || && === !== == != < > <= >= + - * / % ! and ?:

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{BinaryOperator, Expression, UnaryOperator, Value};
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, ParseError, ParseResult, Parser, MAX_NESTING_DEPTH, NAMESPACES};
pub use token::Token;
