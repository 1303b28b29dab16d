//! Expression-validator capability.
//!
//! The engine does not evaluate expressions itself: it consumes a
//! `compile(source) -> callable` capability supplied at schema
//! construction. The sandbox must enforce the operation quotas; the
//! engine maps [`ExprFailure`] onto diagnostic kinds.

use std::sync::Arc;

use thiserror::Error;

use crate::value::Value;

/// Operation quota for the compile-time check of a validator source.
pub const EXPR_COMPILE_QUOTA: u32 = 100;

/// Operation quota for evaluating a validator against one cell value.
pub const EXPR_EVAL_QUOTA: u32 = 1_000;

/// Failure modes of the expression sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprFailure {
    #[error("compile error: {0}")]
    Compile(String),
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("operation quota exhausted")]
    Quota,
}

/// A compiled validator expression.
///
/// `value` is bound to the parsed cell value under test. Evaluation is
/// bounded: the implementation must abort with [`ExprFailure::Quota`]
/// once `quota` operations have been spent.
pub trait CompiledExpr: Send + Sync {
    fn eval(&self, value: &Value, quota: u32) -> Result<Value, ExprFailure>;
}

/// The sandbox's compile capability.
///
/// `quota` bounds the compile-time check of the source; oversized or
/// runaway sources must fail with [`ExprFailure::Quota`] rather than
/// hang.
pub trait ExprCompiler: Send + Sync {
    fn compile(&self, source: &str, quota: u32) -> Result<Arc<dyn CompiledExpr>, ExprFailure>;
}
