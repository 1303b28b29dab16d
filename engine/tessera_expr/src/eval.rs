//! Tree-walking evaluation with an operation budget.

use thiserror::Error;

use tessera_types::{ExprFailure, Value};

use crate::ast::{BinaryOp, Expr, UnaryOp};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{0}")]
    Type(String),
    #[error("undefined name `{0}`")]
    Undefined(String),
    #[error("operation quota exhausted")]
    Quota,
}

impl From<EvalError> for ExprFailure {
    fn from(err: EvalError) -> ExprFailure {
        match err {
            EvalError::Quota => ExprFailure::Quota,
            other => ExprFailure::Runtime(other.to_string()),
        }
    }
}

/// Remaining evaluation steps. Every node visit and helper call costs
/// one.
pub struct Budget {
    remaining: u32,
}

impl Budget {
    pub fn new(quota: u32) -> Self {
        Budget { remaining: quota }
    }

    fn charge(&mut self) -> Result<(), EvalError> {
        if self.remaining == 0 {
            return Err(EvalError::Quota);
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Lua-style truthiness: only nil and false are falsey.
fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Nil | Value::Bool(false))
}

pub fn evaluate(expr: &Expr, value: &Value, budget: &mut Budget) -> Result<Value, EvalError> {
    budget.charge()?;
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Nil => Ok(Value::Nil),
        Expr::Var(name) => {
            if name == "value" {
                Ok(value.clone())
            } else {
                Err(EvalError::Undefined(name.clone()))
            }
        }
        Expr::Unary(op, inner) => {
            let inner = evaluate(inner, value, budget)?;
            match op {
                UnaryOp::Neg => match inner {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::Type(format!(
                        "cannot negate {}",
                        describe(&other)
                    ))),
                },
                UnaryOp::Not => Ok(Value::Bool(!truthy(&inner))),
            }
        }
        Expr::Binary(op, left, right) => binary(*op, left, right, value, budget),
        Expr::Call(name, args) => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, value, budget)?);
            }
            budget.charge()?;
            call(name, &evaluated)
        }
    }
}

fn binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    value: &Value,
    budget: &mut Budget,
) -> Result<Value, EvalError> {
    // and/or short-circuit.
    if op == BinaryOp::And {
        let left = evaluate(left, value, budget)?;
        if !truthy(&left) {
            return Ok(Value::Bool(false));
        }
        let right = evaluate(right, value, budget)?;
        return Ok(Value::Bool(truthy(&right)));
    }
    if op == BinaryOp::Or {
        let left = evaluate(left, value, budget)?;
        if truthy(&left) {
            return Ok(Value::Bool(true));
        }
        let right = evaluate(right, value, budget)?;
        return Ok(Value::Bool(truthy(&right)));
    }

    let left = evaluate(left, value, budget)?;
    let right = evaluate(right, value, budget)?;
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
            _ => Err(type_mismatch("+", &left, &right)),
        },
        BinaryOp::Sub => numeric(op, &left, &right, |a, b| a - b),
        BinaryOp::Mul => numeric(op, &left, &right, |a, b| a * b),
        BinaryOp::Div => numeric(op, &left, &right, |a, b| a / b),
        BinaryOp::Rem => match (&left, &right) {
            (Value::Number(_), Value::Number(b)) if *b == 0.0 => {
                Err(EvalError::Type("modulo by zero".to_owned()))
            }
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a.rem_euclid(*b))),
            _ => Err(type_mismatch("%", &left, &right)),
        },
        BinaryOp::Lt => compare(&left, &right, |ord| ord.is_lt()),
        BinaryOp::LtEq => compare(&left, &right, |ord| ord.is_le()),
        BinaryOp::Gt => compare(&left, &right, |ord| ord.is_gt()),
        BinaryOp::GtEq => compare(&left, &right, |ord| ord.is_ge()),
        // Short-circuit operators returned before operand evaluation.
        BinaryOp::And | BinaryOp::Or => Ok(Value::Bool(truthy(&left) && truthy(&right))),
    }
}

fn numeric(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    f: impl FnOnce(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(*a, *b))),
        _ => Err(type_mismatch(op_name(op), left, right)),
    }
}

fn compare(
    left: &Value,
    right: &Value,
    f: impl FnOnce(std::cmp::Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => return Err(type_mismatch("comparison", left, right)),
    };
    Ok(Value::Bool(f(ordering)))
}

fn type_mismatch(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::Type(format!(
        "invalid operands for {op}: {} and {}",
        describe(left),
        describe(right)
    ))
}

fn op_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::LtEq => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::GtEq => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Str(_) => "string",
        Value::Seq(_) => "sequence",
        Value::Map(_) => "map",
    }
}

#[allow(clippy::cast_precision_loss)]
fn count_to_f64(count: usize) -> f64 {
    count as f64
}

/// The fixed helper environment.
fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (name, args) {
        ("abs", [Value::Number(n)]) => Ok(Value::Number(n.abs())),
        ("floor", [Value::Number(n)]) => Ok(Value::Number(n.floor())),
        ("ceil", [Value::Number(n)]) => Ok(Value::Number(n.ceil())),
        ("min", [Value::Number(a), Value::Number(b)]) => Ok(Value::Number(a.min(*b))),
        ("max", [Value::Number(a), Value::Number(b)]) => Ok(Value::Number(a.max(*b))),
        ("len", [Value::Str(s)]) => Ok(Value::Number(count_to_f64(s.chars().count()))),
        ("len", [Value::Seq(items)]) => Ok(Value::Number(count_to_f64(items.len()))),
        ("len", [Value::Map(entries)]) => Ok(Value::Number(count_to_f64(entries.len()))),
        ("lower", [Value::Str(s)]) => Ok(Value::str(s.to_lowercase())),
        ("upper", [Value::Str(s)]) => Ok(Value::str(s.to_uppercase())),
        ("contains", [Value::Str(s), Value::Str(needle)]) => {
            Ok(Value::Bool(s.contains(needle.as_str())))
        }
        ("starts_with", [Value::Str(s), Value::Str(prefix)]) => {
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        // Deep structural equality, the same relation value parsers use.
        ("equals", [a, b]) => Ok(Value::Bool(a == b)),
        ("abs" | "floor" | "ceil" | "min" | "max" | "len" | "lower" | "upper" | "contains"
        | "starts_with" | "equals", _) => Err(EvalError::Type(format!(
            "wrong arguments for `{name}`"
        ))),
        _ => Err(EvalError::Undefined(name.to_owned())),
    }
}
