//! Tabular-data schema and validation engine.
//!
//! Data packages are described by a manifest plus tab-separated files
//! whose columns carry type annotations in an algebraic type language.
//! This crate wires the engine together and re-exports its surface:
//!
//! - [`new_schema`] builds a ready [`Schema`]: built-in types installed
//!   and the default expression sandbox attached.
//! - Type specs parse via [`Schema::parse_type`]; cell values validate
//!   via [`Schema::parse_value`], yielding a parsed [`Value`] and a
//!   canonical string that round-trips.
//! - All failures flow through a [`DiagnosticSink`]; nothing panics and
//!   nothing returns errors across this surface.
//!
//! ```
//! use tessera::{new_schema, DiagnosticSink, Value, ValueContext};
//!
//! let mut schema = new_schema();
//! let mut sink = DiagnosticSink::new();
//! let (_, canonical) = schema.parse_type(&mut sink, "integer|nil").unwrap();
//! assert_eq!(canonical, "integer|nil");
//!
//! let outcome = schema.parse_value(
//!     &mut sink,
//!     "integer|nil",
//!     &Value::str("42"),
//!     ValueContext::Tsv,
//! );
//! assert_eq!(outcome.reformatted(), "42");
//! assert_eq!(sink.errors(), 0);
//! ```

use std::sync::Arc;

pub use tessera_diagnostic::{Diagnostic, DiagnosticSink, ErrorKind, Severity};
pub use tessera_expr::Sandbox;
pub use tessera_parse::{parse_spec, parse_spec_prefix, SpecParseError, TypeAst};
pub use tessera_types::{
    CompiledExpr, Comparator, ExprCompiler, ExprFailure, ParseOutcome, ParserRef, SchemaRow,
    Schema, TransformFn, TypeDecl, TypeRegistry, ValidatorFn, Value, ValueContext, ValueParser,
    EXPR_COMPILE_QUOTA, EXPR_EVAL_QUOTA, NUMBER_TYPE_TAG, SAFE_INT,
};

/// A schema with the built-in types and the default expression sandbox.
pub fn new_schema() -> Schema {
    let mut schema = Schema::new();
    schema.set_expression_compiler(Arc::new(Sandbox::new()));
    schema
}
