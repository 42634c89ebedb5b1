//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans raw rule text and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number parsing, quoted strings with escapes, and
//! multi-character operators like === and &&.
//!
//! SUPPORTED OPERATORS:
//! - Single char: + - * / % ! < > ? : . ( ) [ ] ,
//! - Multi char: === !== == != <= >= && ||
//!
//! A lone '=', '&' or '|' is reported as Illegal: assignment and bitwise
//! operators do not exist in the rule language.

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('%') => Token::Percent,
            Some('?') => Token::Question,
            Some(':') => Token::Colon,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some('[') => Token::LBracket,
            Some(']') => Token::RBracket,
            Some(',') => Token::Comma,

            // = is only legal as == or ===
            Some('=') => self.read_equals_operator(),

            // ! on its own, or != / !==
            Some('!') => self.read_bang_operator(),

            Some('<') => self.read_relational('<'),
            Some('>') => self.read_relational('>'),

            Some('&') => self.read_doubled('&', Token::AndAnd),
            Some('|') => self.read_doubled('|', Token::OrOr),

            Some(quote @ ('"' | '\'')) => self.read_string(quote),

            // A dot directly followed by a digit starts a number (.5)
            Some('.') => match self.input.peek() {
                Some(ch) if ch.is_ascii_digit() => self.read_number('.'),
                _ => Token::Dot,
            },

            Some(ch) if ch.is_ascii_digit() => self.read_number(ch),

            Some(ch) if is_identifier_start(ch) => self.read_identifier(ch),

            None => Token::EOF,

            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Handles operators starting with '=': ==, ===
    fn read_equals_operator(&mut self) -> Token {
        if self.input.peek() != Some(&'=') {
            return Token::Illegal('=');
        }
        self.input.next();
        if self.input.peek() == Some(&'=') {
            self.input.next();
            Token::StrictEqual
        } else {
            Token::LooseEqual
        }
    }

    /// Handles operators starting with '!': !, !=, !==
    fn read_bang_operator(&mut self) -> Token {
        if self.input.peek() != Some(&'=') {
            return Token::Bang;
        }
        self.input.next();
        if self.input.peek() == Some(&'=') {
            self.input.next();
            Token::StrictNotEqual
        } else {
            Token::LooseNotEqual
        }
    }

    /// Handles <, <=, > and >=.
    fn read_relational(&mut self, first: char) -> Token {
        let or_equal = self.input.peek() == Some(&'=');
        if or_equal {
            self.input.next();
        }
        match (first, or_equal) {
            ('<', false) => Token::LessThan,
            ('<', true) => Token::LessEqual,
            (_, false) => Token::GreaterThan,
            (_, true) => Token::GreaterEqual,
        }
    }

    /// Handles && and ||. The single-character forms are illegal.
    fn read_doubled(&mut self, ch: char, token: Token) -> Token {
        if self.input.peek() == Some(&ch) {
            self.input.next();
            token
        } else {
            Token::Illegal(ch)
        }
    }

    fn read_string(&mut self, quote: char) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            match ch {
                c if c == quote => return Token::String(result),
                '\\' => match self.input.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    // \\ \" \' and any other escaped char stand for themselves
                    Some(other) => result.push(other),
                    None => return Token::UnterminatedString,
                },
                c => result.push(c),
            }
        }
        Token::UnterminatedString
    }

    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';
        let mut has_exponent = false;

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else if ch == '.' && !has_dot && !has_exponent {
                has_dot = true;
                number_str.push(ch);
                self.input.next();
            } else if (ch == 'e' || ch == 'E') && !has_exponent {
                has_exponent = true;
                number_str.push(ch);
                self.input.next();
                if let Some(&sign @ ('+' | '-')) = self.input.peek() {
                    number_str.push(sign);
                    self.input.next();
                }
            } else {
                break;
            }
        }

        match number_str.parse::<f64>() {
            Ok(n) => Token::Number(n),
            // e.g. "1e" with no exponent digits
            Err(_) => Token::Illegal(first_char),
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if is_identifier_start(ch) || ch.is_ascii_digit() {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        // Keywords are case-sensitive, like the identifiers they sit beside.
        match ident.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" | "undefined" => Token::Null,
            _ => Token::Identifier(ident),
        }
    }
}

/// Returns true if `ch` can start an identifier.
fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

/// Lexes the whole input, including the trailing EOF token.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token == Token::EOF;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}
