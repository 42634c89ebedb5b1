//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for rule expressions.
//! CONTEXT: After the Lexer tokenizes the rule text, the Parser converts
//! those tokens into this tree. The rule engine first walks the tree to check
//! it against its whitelist, then interprets it against two bound values.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: Numbers, Strings, Booleans, null
//! - Array literals: [a, b, c]
//! - Identifiers: value1, value2
//! - Member access: value1.length
//! - Indexing: parts[0]
//! - Method calls: value1.toLowerCase()
//! - Function calls: isNumber(value1), Math.abs(x)
//! - Binary operations: || && === !== == != < > <= >= + - * / %
//! - Unary operations: ! - +
//! - Conditional: cond ? a : b

/// Represents a parsed rule expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A literal value: number, string, boolean or null.
    Literal(Value),

    /// A bare name such as `value1`.
    Identifier(String),

    /// An array literal like ["High", "Urgent"].
    Array(Vec<Expression>),

    /// Property access: object.property
    Member {
        object: Box<Expression>,
        property: String,
    },

    /// Index access: object[index]
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },

    /// A method invoked on a value: receiver.method(args)
    MethodCall {
        receiver: Box<Expression>,
        method: String,
        args: Vec<Expression>,
    },

    /// A free function call. Namespaced calls keep their prefix in the
    /// name, so `Math.abs(x)` arrives here as name "Math.abs".
    FunctionCall { name: String, args: Vec<Expression> },

    /// A binary operation: left op right.
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand.
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// condition ? consequent : alternate
    Conditional {
        condition: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
}

impl Expression {
    /// Visits this node and every descendant in pre-order.
    pub fn walk<F: FnMut(&Expression)>(&self, visit: &mut F) {
        visit(self);
        match self {
            Expression::Literal(_) | Expression::Identifier(_) => {}
            Expression::Array(items) => items.iter().for_each(|item| item.walk(visit)),
            Expression::Member { object, .. } => object.walk(visit),
            Expression::Index { object, index } => {
                object.walk(visit);
                index.walk(visit);
            }
            Expression::MethodCall { receiver, args, .. } => {
                receiver.walk(visit);
                args.iter().for_each(|arg| arg.walk(visit));
            }
            Expression::FunctionCall { args, .. } => args.iter().for_each(|arg| arg.walk(visit)),
            Expression::BinaryOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Expression::UnaryOp { operand, .. } => operand.walk(visit),
            Expression::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                condition.walk(visit);
                consequent.walk(visit);
                alternate.walk(visit);
            }
        }
    }
}

/// Literal values that can appear in rules.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

/// Binary operators, grouped from lowest to highest precedence.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    // Logical (short-circuit)
    Or,  // ||
    And, // &&

    // Equality
    StrictEqual,    // ===
    StrictNotEqual, // !==
    Equal,          // ==
    NotEqual,       // !=

    // Relational
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // Arithmetic
    Add,       // +
    Subtract,  // -
    Multiply,  // *
    Divide,    // /
    Remainder, // %
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Not,    // !
    Negate, // -
    Plus,   // + (numeric coercion)
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::StrictEqual => "===",
            BinaryOperator::StrictNotEqual => "!==",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
        };
        write!(f, "{}", symbol)
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "!"),
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Plus => write!(f, "+"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}
