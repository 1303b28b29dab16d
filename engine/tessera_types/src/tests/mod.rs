//! Engine tests.
//!
//! Organised by concern:
//! - `builtins`: value parsing and canonical strings of the built-ins
//! - `construct`: type construction for composite specs
//! - `restrict`: the restriction API
//! - `subtype`: the extends/restricts relation and introspection

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

mod builtins;
mod construct;
mod restrict;
mod subtype;

use tessera_diagnostic::{DiagnosticSink, ErrorKind, Severity};

use crate::{ParseOutcome, Schema, Value, ValueContext};

/// A fresh schema with built-ins only.
fn schema() -> Schema {
    Schema::new()
}

/// Parse `input` as cell text under `spec`, expecting success.
fn parse_ok(schema: &mut Schema, spec: &str, input: &str) -> (Value, String) {
    let mut sink = DiagnosticSink::new();
    schema.parse_type(&mut sink, spec).expect("type should build");
    let outcome = schema.parse_value(&mut sink, spec, &Value::str(input), ValueContext::Tsv);
    assert_eq!(sink.errors(), 0, "unexpected errors: {:?}", sink.diagnostics());
    match outcome {
        ParseOutcome::Ok { value, reformatted } => (value, reformatted),
        ParseOutcome::Fail { reformatted } => {
            panic!("`{input}` failed under `{spec}` (reformatted: {reformatted})")
        }
    }
}

/// Parse `input` as cell text under `spec`, expecting failure; returns
/// the kind of the first recorded error.
fn parse_err(schema: &mut Schema, spec: &str, input: &str) -> ErrorKind {
    let mut sink = DiagnosticSink::new();
    schema.parse_type(&mut sink, spec).expect("type should build");
    assert_eq!(sink.errors(), 0);
    let outcome = schema.parse_value(&mut sink, spec, &Value::str(input), ValueContext::Tsv);
    assert!(
        !outcome.is_ok(),
        "`{input}` unexpectedly passed under `{spec}`"
    );
    assert!(sink.errors() > 0, "failure must log at least one error");
    sink.diagnostics()
        .iter()
        .find(|d| d.severity == Severity::Error)
        .expect("an error diagnostic must be recorded")
        .kind
}
