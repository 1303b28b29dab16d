//! The value-parser contract.
//!
//! A value parser validates one cell value against one type and renders
//! the canonical string form. Parsers are pure readers of the registry:
//! they are built during schema build-up and only ever take `&TypeRegistry`
//! afterwards, so validating independent rows in parallel is safe.

use std::sync::Arc;

use tessera_diagnostic::DiagnosticSink;

use crate::registry::TypeRegistry;
use crate::value::Value;

/// Where a raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueContext {
    /// The value is cell text: a string, or nil for an empty cell.
    #[default]
    Tsv,
    /// The value is already materialised; only structural invariants
    /// are checked.
    Parsed,
}

/// Result of one value parse.
///
/// A failing parse still carries a best-effort reformatted string, and
/// has logged exactly one error on the caller's sink (union trials run
/// against isolated null sinks and report a single aggregate failure).
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Ok { value: Value, reformatted: String },
    Fail { reformatted: String },
}

impl ParseOutcome {
    pub fn ok(value: Value, reformatted: impl Into<String>) -> Self {
        ParseOutcome::Ok {
            value,
            reformatted: reformatted.into(),
        }
    }

    pub fn fail(reformatted: impl Into<String>) -> Self {
        ParseOutcome::Fail {
            reformatted: reformatted.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ParseOutcome::Ok { .. })
    }

    /// The parsed value, if the parse succeeded.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseOutcome::Ok { value, .. } => Some(value),
            ParseOutcome::Fail { .. } => None,
        }
    }

    pub fn reformatted(&self) -> &str {
        match self {
            ParseOutcome::Ok { reformatted, .. } | ParseOutcome::Fail { reformatted } => {
                reformatted
            }
        }
    }

    /// Split into `(value, reformatted)`.
    pub fn into_parts(self) -> (Option<Value>, String) {
        match self {
            ParseOutcome::Ok { value, reformatted } => (Some(value), reformatted),
            ParseOutcome::Fail { reformatted } => (None, reformatted),
        }
    }
}

/// A value parser installed in the registry under its canonical spec.
pub trait ValueParser: Send + Sync {
    fn parse(
        &self,
        reg: &TypeRegistry,
        sink: &mut DiagnosticSink,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome;
}

/// Shared handle to an installed parser.
pub type ParserRef = Arc<dyn ValueParser>;
