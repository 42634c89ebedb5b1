//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree. A rule is always exactly one
//! expression; anything left over after it is an error.
//!
//! GRAMMAR:
//!   expression     --> conditional
//!   conditional    --> logical_or ( "?" expression ":" expression )?
//!   logical_or     --> logical_and ( "||" logical_and )*
//!   logical_and    --> equality ( "&&" equality )*
//!   equality       --> comparison ( ("===" | "!==" | "==" | "!=") comparison )*
//!   comparison     --> additive ( ("<" | ">" | "<=" | ">=") additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//!   unary          --> ("!" | "-" | "+") unary | postfix
//!   postfix        --> primary ( "." IDENTIFIER call_suffix? | "[" expression "]" )*
//!   primary        --> NUMBER | STRING | BOOLEAN | NULL
//!                    | NAMESPACE "." IDENTIFIER call_suffix
//!                    | IDENTIFIER call_suffix?
//!                    | "[" arguments? "]" | "(" expression ")"
//!   call_suffix    --> "(" arguments? ")"
//!   arguments      --> expression ("," expression)*

use crate::ast::{BinaryOperator, Expression, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::Token;

/// Deepest expression nesting the parser accepts.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Prefixes that turn `Prefix.name(...)` into a single namespaced call.
pub const NAMESPACES: &[&str] = &["Math", "Number"];

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            depth: 0,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Checks if the current token matches the expected token.
    /// If it matches, advances and returns Ok. Otherwise returns an error.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected '{}', found '{}'",
                expected, self.current_token
            )))
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::new(format!(
                "Expression nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Entry point for expression parsing. Every nested expression passes
    /// through here, which is where the depth limit is enforced.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.enter()?;
        let expr = self.parse_conditional();
        self.leave();
        expr
    }

    fn parse_conditional(&mut self) -> ParseResult<Expression> {
        let condition = self.parse_logical_or()?;

        if self.current_token != Token::Question {
            return Ok(condition);
        }

        self.advance();
        let consequent = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_expression()?;

        Ok(Expression::Conditional {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.current_token == Token::OrOr {
            self.advance();
            let right = self.parse_logical_and()?;
            left = binary(left, BinaryOperator::Or, right);
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_equality()?;

        while self.current_token == Token::AndAnd {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(left, BinaryOperator::And, right);
        }

        Ok(left)
    }

    /// Parses equality expressions (===, !==, ==, !=).
    fn parse_equality(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match &self.current_token {
                Token::StrictEqual => BinaryOperator::StrictEqual,
                Token::StrictNotEqual => BinaryOperator::StrictNotEqual,
                Token::LooseEqual => BinaryOperator::Equal,
                Token::LooseNotEqual => BinaryOperator::NotEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_comparison()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parses relational expressions (<, >, <=, >=).
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (*, / and %).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Remainder,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }

        Ok(left)
    }

    /// Parses prefix operators (!, -, +).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match &self.current_token {
            Token::Bang => UnaryOperator::Not,
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            _ => return self.parse_postfix(),
        };

        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();

        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand?),
        })
    }

    /// Parses member access, method calls and indexing chained onto a primary.
    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token {
                Token::Dot => {
                    self.advance();
                    let name = self.expect_identifier("after '.'")?;

                    expr = if self.current_token == Token::LParen {
                        let args = self.parse_call_arguments()?;
                        Expression::MethodCall {
                            receiver: Box::new(expr),
                            method: name,
                            args,
                        }
                    } else {
                        Expression::Member {
                            object: Box::new(expr),
                            property: name,
                        }
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket)?;
                    expr = Expression::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parses primary expressions (literals, names, calls, arrays, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }

            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }

            Token::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(b)))
            }

            Token::Null => {
                self.advance();
                Ok(Expression::Literal(Value::Null))
            }

            // Identifier: a bound value, a function call, or a namespace prefix
            Token::Identifier(name) => {
                self.advance();

                if NAMESPACES.contains(&name.as_str()) && self.current_token == Token::Dot {
                    self.advance();
                    let member = self.expect_identifier("after namespace")?;
                    if self.current_token != Token::LParen {
                        return Err(ParseError::new(format!(
                            "Expected call to {}.{}",
                            name, member
                        )));
                    }
                    let args = self.parse_call_arguments()?;
                    return Ok(Expression::FunctionCall {
                        name: format!("{}.{}", name, member),
                        args,
                    });
                }

                if self.current_token == Token::LParen {
                    let args = self.parse_call_arguments()?;
                    return Ok(Expression::FunctionCall { name, args });
                }

                Ok(Expression::Identifier(name))
            }

            Token::LBracket => {
                self.advance();
                let items = self.parse_list(Token::RBracket)?;
                Ok(Expression::Array(items))
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression")),

            Token::UnterminatedString => Err(ParseError::new("Unterminated string literal")),

            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),

            token => Err(ParseError::new(format!("Unexpected token: {}", token))),
        }
    }

    /// Parses "(" arguments? ")" with the current token on the '('.
    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect(Token::LParen)?;
        self.parse_list(Token::RParen)
    }

    /// Parses a comma separated expression list up to and including `close`.
    fn parse_list(&mut self, close: Token) -> ParseResult<Vec<Expression>> {
        let mut items = Vec::new();

        if self.current_token == close {
            self.advance();
            return Ok(items);
        }

        items.push(self.parse_expression()?);

        while self.current_token == Token::Comma {
            self.advance();
            items.push(self.parse_expression()?);
        }

        self.expect(close)?;

        Ok(items)
    }

    fn expect_identifier(&mut self, context: &str) -> ParseResult<String> {
        match self.current_token.clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError::new(format!(
                "Expected name {}, found '{}'",
                context, other
            ))),
        }
    }
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Convenience function to parse rule text directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input);
    parser.parse()
}
