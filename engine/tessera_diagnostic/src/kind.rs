use std::fmt;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Classification of a diagnostic.
///
/// Every failure the engine can report falls into one of these kinds;
/// tests and callers match on the kind rather than on message text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorKind {
    /// Malformed type spec or value string.
    Parse,
    /// A name that resolves to no registered type.
    UnknownType,
    /// Registration under a name that is already taken with different semantics.
    DuplicateName,
    /// A record redefinition that does not narrow the inherited field type.
    IncompatibleRedefinition,
    /// Numeric value or string length outside the permitted range.
    OutOfRange,
    /// String does not match the required pattern.
    PatternMismatch,
    /// Value is not one of the enum's labels.
    EnumLabel,
    /// Value matches no member of the union.
    UnionMember,
    /// Invalid self-reference: cycle, missing target, or a target whose
    /// type does not produce type names.
    SelfRef,
    /// Validator expression failed to compile.
    ExpressionCompile,
    /// Validator expression failed at evaluation time.
    ExpressionRuntime,
    /// Operation quota exhausted while compiling or evaluating an expression.
    Quota,
    /// 64-bit value not exactly representable on this host.
    PrecisionLoss,
    /// Invariant violation inside the engine.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::UnknownType => "unknown type",
            ErrorKind::DuplicateName => "duplicate name",
            ErrorKind::IncompatibleRedefinition => "incompatible redefinition",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::PatternMismatch => "pattern mismatch",
            ErrorKind::EnumLabel => "enum label",
            ErrorKind::UnionMember => "union member",
            ErrorKind::SelfRef => "self-reference",
            ErrorKind::ExpressionCompile => "expression compile",
            ErrorKind::ExpressionRuntime => "expression runtime",
            ErrorKind::Quota => "quota",
            ErrorKind::PrecisionLoss => "precision loss",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
