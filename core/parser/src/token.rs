//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Token definitions for the rule expression lexer.
//! CONTEXT: Tokens are the atomic units produced by the lexer and consumed by
//! the parser. The validator also scans them directly for blocklisted names.

/// Tokens recognized by the rule lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Identifier(String),

    // Arithmetic
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,

    // Comparison
    StrictEqual,
    StrictNotEqual,
    LooseEqual,
    LooseNotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    // Logic
    Bang,
    AndAnd,
    OrOr,
    Question,
    Colon,

    // Delimiters
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    // Special
    EOF,
    Illegal(char),
    /// A string literal whose closing quote never arrived.
    UnterminatedString,
}

impl Token {
    /// True for tokens that count as operators when scoring rule complexity.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Asterisk
                | Token::Slash
                | Token::Percent
                | Token::StrictEqual
                | Token::StrictNotEqual
                | Token::LooseEqual
                | Token::LooseNotEqual
                | Token::LessThan
                | Token::GreaterThan
                | Token::LessEqual
                | Token::GreaterEqual
                | Token::Bang
                | Token::AndAnd
                | Token::OrOr
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "null"),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::StrictEqual => write!(f, "==="),
            Token::StrictNotEqual => write!(f, "!=="),
            Token::LooseEqual => write!(f, "=="),
            Token::LooseNotEqual => write!(f, "!="),
            Token::LessThan => write!(f, "<"),
            Token::GreaterThan => write!(f, ">"),
            Token::LessEqual => write!(f, "<="),
            Token::GreaterEqual => write!(f, ">="),
            Token::Bang => write!(f, "!"),
            Token::AndAnd => write!(f, "&&"),
            Token::OrOr => write!(f, "||"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::EOF => write!(f, "EOF"),
            Token::Illegal(c) => write!(f, "ILLEGAL({})", c),
            Token::UnterminatedString => write!(f, "UNTERMINATED_STRING"),
        }
    }
}
