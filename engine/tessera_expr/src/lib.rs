//! Quota-bounded expression sandbox.
//!
//! Implements the engine's `compile(source) -> callable` capability for
//! `validate` predicates. The language is deliberately small: literals,
//! the bound `value`, arithmetic, comparisons, `and`/`or`/`not`, and a
//! fixed helper environment. There are no loops, no assignment and no
//! host access, so evaluation cost is bounded by expression size, and
//! both compilation and evaluation still charge an operation quota, so
//! pathological inputs fail with `ExprFailure::Quota` instead of
//! crawling.

mod ast;
mod eval;
mod lexer;
mod parser;


use std::sync::Arc;

use tessera_types::{CompiledExpr, ExprCompiler, ExprFailure, Value};

use ast::Expr;

/// The default expression sandbox.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sandbox;

impl Sandbox {
    pub fn new() -> Self {
        Sandbox
    }
}

impl ExprCompiler for Sandbox {
    fn compile(&self, source: &str, quota: u32) -> Result<Arc<dyn CompiledExpr>, ExprFailure> {
        let tokens = lexer::lex(source).map_err(|err| ExprFailure::Compile(err.to_string()))?;
        // Compilation charges the quota per token; an oversized source
        // exhausts it before parsing starts.
        if tokens.len() as u64 > u64::from(quota) {
            return Err(ExprFailure::Quota);
        }
        let expr = parser::parse(&tokens).map_err(|err| ExprFailure::Compile(err.to_string()))?;
        Ok(Arc::new(CompiledExpression { expr }))
    }
}

/// A parsed validator expression.
struct CompiledExpression {
    expr: Expr,
}

impl CompiledExpr for CompiledExpression {
    fn eval(&self, value: &Value, quota: u32) -> Result<Value, ExprFailure> {
        let mut budget = eval::Budget::new(quota);
        eval::evaluate(&self.expr, value, &mut budget).map_err(ExprFailure::from)
    }
}
