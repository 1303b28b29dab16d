use std::fmt;

use tracing::{error, warn};

use crate::{ErrorKind, Severity};

/// A recorded diagnostic with its attribution snapshot.
///
/// The snapshot is taken at record time, so diagnostics stay correct
/// even after the sink moves on to another cell.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: String,
    /// Name of the file or table the value came from.
    pub source: Option<String>,
    /// Key of the row under validation.
    pub row_key: Option<String>,
    /// Zero-based column index.
    pub column_index: Option<usize>,
    pub column_name: Option<String>,
    /// Chain of column types entered via [`DiagnosticSink::with_col_type`],
    /// outermost first.
    pub type_chain: Vec<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " (source: {source}")?;
            if let Some(row) = &self.row_key {
                write!(f, ", row: {row}")?;
            }
            if let Some(col) = &self.column_name {
                write!(f, ", column: {col}")?;
            } else if let Some(idx) = self.column_index {
                write!(f, ", column #{idx}")?;
            }
            write!(f, ")")?;
        }
        if !self.type_chain.is_empty() {
            write!(f, " in {}", self.type_chain.join(" > "))?;
        }
        Ok(())
    }
}

/// Accumulating diagnostic sink.
///
/// Counts errors and warnings, records diagnostics attributed to the
/// current context, and logs them through `tracing`. The error counter
/// is the single signal external code consults: every value-parser
/// failure path increments it exactly once.
#[derive(Default, Debug)]
pub struct DiagnosticSink {
    errors: u64,
    warnings: u64,
    diagnostics: Vec<Diagnostic>,
    source: Option<String>,
    row_key: Option<String>,
    column_index: Option<usize>,
    column_name: Option<String>,
    type_chain: Vec<String>,
    silent: bool,
}

impl DiagnosticSink {
    /// Create a sink that records and logs.
    pub fn new() -> Self {
        DiagnosticSink::default()
    }

    /// Create a null sink: counters work, but nothing is recorded or
    /// logged. Used for trial parses.
    pub fn null() -> Self {
        DiagnosticSink {
            silent: true,
            ..DiagnosticSink::default()
        }
    }

    /// Number of errors recorded so far.
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Number of warnings recorded so far.
    pub fn warnings(&self) -> u64 {
        self.warnings
    }

    /// Whether at least one error was recorded.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// All recorded diagnostics, in record order. Always empty for a
    /// null sink.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    /// Name of the current source, if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_row_key(&mut self, key: impl Into<String>) {
        self.row_key = Some(key.into());
    }

    pub fn set_column(&mut self, index: usize, name: impl Into<String>) {
        self.column_index = Some(index);
        self.column_name = Some(name.into());
    }

    /// Clear row and column attribution, keeping the source.
    pub fn clear_position(&mut self) {
        self.row_key = None;
        self.column_index = None;
        self.column_name = None;
    }

    /// Record an error diagnostic and bump the error counter.
    pub fn error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.errors += 1;
        self.record(kind, Severity::Error, message.into());
    }

    /// Record a warning diagnostic and bump the warning counter.
    pub fn warning(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.warnings += 1;
        self.record(kind, Severity::Warning, message.into());
    }

    /// Run `f` with `ty` pushed on the column-type chain.
    ///
    /// The frame is popped again when `f` returns, including on early
    /// return from inside the closure.
    pub fn with_col_type<R>(&mut self, ty: &str, f: impl FnOnce(&mut DiagnosticSink) -> R) -> R {
        self.type_chain.push(ty.to_owned());
        let result = f(self);
        self.type_chain.pop();
        result
    }

    /// The current column-type chain, outermost first.
    pub fn type_chain(&self) -> &[String] {
        &self.type_chain
    }

    fn record(&mut self, kind: ErrorKind, severity: Severity, message: String) {
        if self.silent {
            return;
        }
        let diagnostic = Diagnostic {
            kind,
            severity,
            message,
            source: self.source.clone(),
            row_key: self.row_key.clone(),
            column_index: self.column_index,
            column_name: self.column_name.clone(),
            type_chain: self.type_chain.clone(),
        };
        match severity {
            Severity::Error => error!(
                target: "tessera",
                kind = %kind,
                source = diagnostic.source.as_deref().unwrap_or(""),
                row = diagnostic.row_key.as_deref().unwrap_or(""),
                column = diagnostic.column_name.as_deref().unwrap_or(""),
                "{}",
                diagnostic.message
            ),
            Severity::Warning => warn!(
                target: "tessera",
                kind = %kind,
                source = diagnostic.source.as_deref().unwrap_or(""),
                row = diagnostic.row_key.as_deref().unwrap_or(""),
                column = diagnostic.column_name.as_deref().unwrap_or(""),
                "{}",
                diagnostic.message
            ),
        }
        self.diagnostics.push(diagnostic);
    }
}
