//! Type registry, value parsers and subtyping for the tessera engine.
//!
//! The pipeline: a type-spec string parses to a `TypeAst`
//! (`tessera_parse`), the type constructor turns the AST into a value
//! parser installed in the [`TypeRegistry`] under the canonical spec,
//! and every cell value is pushed through that parser, yielding a
//! parsed [`Value`] plus a canonical string that round-trips.
//!
//! # Concurrency
//!
//! Type construction is single-threaded (`&mut TypeRegistry`). Value
//! parsers only read the registry, so once the schema is built, rows
//! can be validated on as many threads as the host likes.

mod build;
mod builtins;
mod cell;
mod compare;
mod contract;
mod decl;
mod default;
mod entry;
mod export;
mod expr;
mod num;
mod parsers;
mod registry;
mod restrict;
mod schema;
mod subtype;
mod value;

#[cfg(test)]
mod tests;

pub use contract::{ParseOutcome, ParserRef, ValueContext, ValueParser};
pub use decl::TypeDecl;
pub use entry::{FieldInfo, TupleSlot, TypeEntry, TypeFlags, TypeKind, TypeNaming};
pub use export::SchemaRow;
pub use expr::{CompiledExpr, ExprCompiler, ExprFailure, EXPR_COMPILE_QUOTA, EXPR_EVAL_QUOTA};
pub use num::{format_float, format_integer, format_number, parse_number, SAFE_INT};
pub use parsers::{TransformFn, ValidatorFn};
pub use registry::{Comparator, NumberLimits, StrLimits, TypeRegistry};
pub use schema::Schema;
pub use value::Value;

pub use builtins::NUMBER_TYPE_TAG;
