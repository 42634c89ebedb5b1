//! FILENAME: core/rule-engine/src/interpreter.rs
//! PURPOSE: Evaluates a validated rule AST against two bound values.
//! CONTEXT: Rules are never compiled to host code. This tree-walker only
//! knows the node kinds the parser produces, binds exactly `value1` and
//! `value2`, and resolves calls against the built-ins and the engine's
//! registered functions. A wall-clock deadline is checked at every node.

use crate::builtins;
use crate::error::EvalError;
use crate::methods;
use crate::value::RuleValue;
use parser::{BinaryOperator, Expression, UnaryOperator, Value};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// A host function made available to rules through `register_function`.
pub type CustomFunction = Arc<dyn Fn(&[RuleValue]) -> Result<RuleValue, String> + Send + Sync>;

/// Registered functions by name.
pub type FunctionRegistry = FxHashMap<String, CustomFunction>;

/// The bindings visible to one rule execution.
pub struct ExecutionContext<'a> {
    pub value1: RuleValue,
    pub value2: RuleValue,
    pub functions: &'a FunctionRegistry,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(value1: &str, value2: &str, functions: &'a FunctionRegistry) -> Self {
        ExecutionContext {
            value1: RuleValue::from(value1),
            value2: RuleValue::from(value2),
            functions,
        }
    }
}

/// The rule interpreter.
pub struct Interpreter<'a> {
    context: &'a ExecutionContext<'a>,
    deadline: Option<Instant>,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a ExecutionContext<'a>) -> Self {
        Interpreter {
            context,
            deadline: None,
        }
    }

    /// Stops evaluation with `EvalError::Timeout` once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Evaluates the rule and coerces the outcome to a boolean.
    pub fn run(&self, expr: &Expression) -> Result<bool, EvalError> {
        let value = self.evaluate(expr)?;
        // A host function can overrun the budget without visiting another node
        self.check_deadline()?;
        Ok(value.truthy())
    }

    /// Evaluates an expression to a value.
    pub fn evaluate(&self, expr: &Expression) -> Result<RuleValue, EvalError> {
        self.check_deadline()?;

        match expr {
            Expression::Literal(value) => Ok(self.eval_literal(value)),
            Expression::Identifier(name) => self.eval_identifier(name),
            Expression::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RuleValue::Array(values))
            }
            Expression::Member { object, property } => {
                let object = self.evaluate(object)?;
                methods::get_property(&object, property)
            }
            Expression::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                methods::get_index(&object, &index)
            }
            Expression::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.evaluate(receiver)?;
                let args = self.eval_args(args)?;
                methods::call_method(&receiver, method, &args)
            }
            Expression::FunctionCall { name, args } => {
                let args = self.eval_args(args)?;
                self.eval_function(name, &args)
            }
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, *op, right),
            Expression::UnaryOp { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOperator::Not => RuleValue::Boolean(!value.truthy()),
                    UnaryOperator::Negate => RuleValue::Number(-value.as_number()),
                    UnaryOperator::Plus => RuleValue::Number(value.as_number()),
                })
            }
            Expression::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                if self.evaluate(condition)?.truthy() {
                    self.evaluate(consequent)
                } else {
                    self.evaluate(alternate)
                }
            }
        }
    }

    fn check_deadline(&self) -> Result<(), EvalError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(EvalError::Timeout),
            _ => Ok(()),
        }
    }

    fn eval_literal(&self, value: &Value) -> RuleValue {
        match value {
            Value::Number(n) => RuleValue::Number(*n),
            Value::String(s) => RuleValue::Text(s.clone()),
            Value::Boolean(b) => RuleValue::Boolean(*b),
            Value::Null => RuleValue::Null,
        }
    }

    fn eval_identifier(&self, name: &str) -> Result<RuleValue, EvalError> {
        match name {
            "value1" => Ok(self.context.value1.clone()),
            "value2" => Ok(self.context.value2.clone()),
            _ => Err(EvalError::UnknownIdentifier(name.to_string())),
        }
    }

    fn eval_args(&self, args: &[Expression]) -> Result<SmallVec<[RuleValue; 4]>, EvalError> {
        args.iter().map(|arg| self.evaluate(arg)).collect()
    }

    fn eval_function(&self, name: &str, args: &[RuleValue]) -> Result<RuleValue, EvalError> {
        if builtins::is_builtin(name) {
            return builtins::call(name, args);
        }

        match self.context.functions.get(name) {
            Some(function) => function(args).map_err(|message| EvalError::Function {
                name: name.to_string(),
                message,
            }),
            None => Err(EvalError::UnknownFunction(name.to_string())),
        }
    }

    // ========================================
    // BINARY OPERATIONS
    // ========================================

    /// The right operand is evaluated lazily so `||` and `&&` can
    /// short-circuit; they yield an operand rather than a boolean.
    fn eval_binary_op(
        &self,
        left: &Expression,
        op: BinaryOperator,
        right: &Expression,
    ) -> Result<RuleValue, EvalError> {
        let left = self.evaluate(left)?;
        let rhs = || self.evaluate(right);

        let value = match op {
            BinaryOperator::Or => return if left.truthy() { Ok(left) } else { rhs() },
            BinaryOperator::And => return if left.truthy() { rhs() } else { Ok(left) },

            BinaryOperator::StrictEqual => RuleValue::Boolean(left.strict_equals(&rhs()?)),
            BinaryOperator::StrictNotEqual => RuleValue::Boolean(!left.strict_equals(&rhs()?)),
            BinaryOperator::Equal => RuleValue::Boolean(left.loose_equals(&rhs()?)),
            BinaryOperator::NotEqual => RuleValue::Boolean(!left.loose_equals(&rhs()?)),

            BinaryOperator::LessThan => self.eval_relational(&left, &rhs()?, |o| o == Ordering::Less),
            BinaryOperator::GreaterThan => self.eval_relational(&left, &rhs()?, |o| o == Ordering::Greater),
            BinaryOperator::LessEqual => self.eval_relational(&left, &rhs()?, |o| o != Ordering::Greater),
            BinaryOperator::GreaterEqual => self.eval_relational(&left, &rhs()?, |o| o != Ordering::Less),

            BinaryOperator::Add => self.eval_add(&left, &rhs()?),
            BinaryOperator::Subtract => RuleValue::Number(left.as_number() - rhs()?.as_number()),
            BinaryOperator::Multiply => RuleValue::Number(left.as_number() * rhs()?.as_number()),
            BinaryOperator::Divide => RuleValue::Number(left.as_number() / rhs()?.as_number()),
            BinaryOperator::Remainder => RuleValue::Number(left.as_number() % rhs()?.as_number()),
        };
        Ok(value)
    }

    /// `+` concatenates as soon as either side is text (or an array).
    fn eval_add(&self, left: &RuleValue, right: &RuleValue) -> RuleValue {
        let concatenates = |v: &RuleValue| matches!(v, RuleValue::Text(_) | RuleValue::Array(_));
        if concatenates(left) || concatenates(right) {
            RuleValue::Text(format!("{}{}", left.as_text(), right.as_text()))
        } else {
            RuleValue::Number(left.as_number() + right.as_number())
        }
    }

    /// Text pairs compare lexicographically, everything else numerically.
    /// Any comparison involving NaN is false.
    fn eval_relational(
        &self,
        left: &RuleValue,
        right: &RuleValue,
        accept: impl Fn(Ordering) -> bool,
    ) -> RuleValue {
        let ordering = match (left, right) {
            (RuleValue::Text(a), RuleValue::Text(b)) => Some(a.cmp(b)),
            _ => left.as_number().partial_cmp(&right.as_number()),
        };
        RuleValue::Boolean(ordering.map(accept).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn eval_with(rule: &str, v1: &str, v2: &str, functions: &FunctionRegistry) -> Result<RuleValue, EvalError> {
        let expr = parser::parse(rule).unwrap();
        let context = ExecutionContext::new(v1, v2, functions);
        Interpreter::new(&context).evaluate(&expr)
    }

    fn eval(rule: &str, v1: &str, v2: &str) -> Result<RuleValue, EvalError> {
        eval_with(rule, v1, v2, &FunctionRegistry::default())
    }

    fn truth(rule: &str, v1: &str, v2: &str) -> bool {
        let expr = parser::parse(rule).unwrap();
        let functions = FunctionRegistry::default();
        let context = ExecutionContext::new(v1, v2, &functions);
        Interpreter::new(&context).run(&expr).unwrap()
    }

    #[test]
    fn test_binds_both_values_as_text() {
        assert_eq!(eval("value1", "42", "x").unwrap(), RuleValue::from("42"));
        assert!(!truth("value1 === 42", "42", ""));
        assert!(truth("value1 == 42", "42", ""));
    }

    #[test]
    fn test_unknown_identifier() {
        assert_eq!(
            eval("value3", "a", "b").unwrap_err(),
            EvalError::UnknownIdentifier("value3".to_string())
        );
    }

    #[test]
    fn test_addition_concatenates_text() {
        assert_eq!(eval("value1 + value2", "1", "2").unwrap(), RuleValue::from("12"));
        assert_eq!(eval("Number(value1) + Number(value2)", "1", "2").unwrap(), RuleValue::Number(3.0));
        assert_eq!(eval("1 + true", "", "").unwrap(), RuleValue::Number(2.0));
    }

    #[test]
    fn test_arithmetic_never_errors() {
        assert_eq!(eval("1 / 0", "", "").unwrap(), RuleValue::Number(f64::INFINITY));
        match eval("value1 * 2", "abc", "").unwrap() {
            RuleValue::Number(n) => assert!(n.is_nan()),
            other => panic!("Expected number, got {:?}", other),
        }
        assert_eq!(eval("-7 % 3", "", "").unwrap(), RuleValue::Number(-1.0));
    }

    #[test]
    fn test_relational_text_versus_numbers() {
        // Lexicographic: "10" < "9"
        assert!(truth("value1 < value2", "10", "9"));
        assert!(!truth("Number(value1) < Number(value2)", "10", "9"));
        assert!(truth("value1 >= 5", "10", ""));
        assert!(!truth("value1 < 5", "abc", ""));
        assert!(!truth("value1 >= 5", "abc", ""));
    }

    #[test]
    fn test_logical_operators_yield_operands() {
        assert_eq!(eval("value1 || 'fallback'", "", "").unwrap(), RuleValue::from("fallback"));
        assert_eq!(eval("value1 && value2", "a", "b").unwrap(), RuleValue::from("b"));
        assert_eq!(eval("value1 && value2", "", "b").unwrap(), RuleValue::from(""));
    }

    #[test]
    fn test_short_circuit_skips_failing_branch() {
        assert!(truth("true || value1.trim()", "", ""));
        assert!(!truth("false && missing()", "", ""));
        assert!(truth("value1 || value2.split(',')[3].length", "x", ""));
    }

    #[test]
    fn test_conditional() {
        assert_eq!(eval("value1 ? 'yes' : 'no'", "x", "").unwrap(), RuleValue::from("yes"));
        assert_eq!(eval("value1 ? 'yes' : 'no'", "", "").unwrap(), RuleValue::from("no"));
    }

    #[test]
    fn test_namespaced_and_method_calls() {
        assert!(truth("Math.abs(Number(value1) - Number(value2)) <= 100", "1000", "1050"));
        assert!(truth("String(value1).toLowerCase() === String(value2).toLowerCase()", "Hello", "HELLO"));
        assert!(truth("value1.split('-')[0] === value2.split('-')[0]", "A-001", "A-002"));
        assert!(truth("['Done', 'Completed'].includes(value1)", "Done", ""));
    }

    #[test]
    fn test_null_access_is_a_runtime_error() {
        let err = eval("null.length", "", "").unwrap_err();
        assert_eq!(err.to_string(), "Cannot read properties of null (reading 'length')");
    }

    #[test]
    fn test_registered_function() {
        let mut functions = FunctionRegistry::default();
        functions.insert(
            "sameSku".to_string(),
            Arc::new(|args: &[RuleValue]| -> Result<RuleValue, String> {
                let a = args.first().map(|v| v.as_text()).unwrap_or_default();
                let b = args.get(1).map(|v| v.as_text()).unwrap_or_default();
                Ok(RuleValue::Boolean(a[..3.min(a.len())] == b[..3.min(b.len())]))
            }) as CustomFunction,
        );
        functions.insert(
            "explode".to_string(),
            Arc::new(|_: &[RuleValue]| -> Result<RuleValue, String> { Err("boom".to_string()) })
                as CustomFunction,
        );

        assert_eq!(
            eval_with("sameSku(value1, value2)", "ABC-1", "ABC-2", &functions).unwrap(),
            RuleValue::Boolean(true)
        );
        assert_eq!(
            eval_with("explode()", "", "", &functions).unwrap_err().to_string(),
            "explode failed: boom"
        );
        assert_eq!(
            eval("sameSku(value1)", "", "").unwrap_err(),
            EvalError::UnknownFunction("sameSku".to_string())
        );
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let expr = parser::parse("value1 === value2").unwrap();
        let functions = FunctionRegistry::default();
        let context = ExecutionContext::new("a", "a", &functions);
        let past = Instant::now() - Duration::from_millis(5);

        let err = Interpreter::new(&context).with_deadline(past).run(&expr).unwrap_err();
        assert_eq!(err, EvalError::Timeout);
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn test_slow_host_function_times_out_after_evaluation() {
        let mut functions = FunctionRegistry::default();
        functions.insert(
            "slow".to_string(),
            Arc::new(|_: &[RuleValue]| -> Result<RuleValue, String> {
                std::thread::sleep(Duration::from_millis(30));
                Ok(RuleValue::Boolean(true))
            }) as CustomFunction,
        );

        let expr = parser::parse("slow()").unwrap();
        let context = ExecutionContext::new("", "", &functions);
        let deadline = Instant::now() + Duration::from_millis(5);

        let err = Interpreter::new(&context).with_deadline(deadline).run(&expr).unwrap_err();
        assert_eq!(err, EvalError::Timeout);
    }
}
