//! Structural type entries backing introspection.

use std::collections::BTreeMap;

use bitflags::bitflags;

bitflags! {
    /// Per-type boolean registry tables, packed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TypeFlags: u8 {
        /// Values of this type are never tables (scalar, string-keyed).
        const NEVER_TABLE = 1 << 0;
        /// The type is a union with a nil member.
        const OPTIONAL = 1 << 1;
        /// Registered during engine initialisation.
        const BUILT_IN = 1 << 2;
        /// Serialisation hint: always reformat as a string.
        const FORCE_STRING = 1 << 3;
        /// The installed parser accepts nil input.
        const NIL_UNION = 1 << 4;
    }
}

/// How values of a type name other types, if they do.
///
/// Drives self-reference validation: a self-ref target must be a field
/// whose type produces type names, and the self-ref inherits the
/// target's ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNaming {
    /// Any registered type name (`type`, `type_spec`, `name`).
    Any,
    /// Names a type equal to or extending the given spec (`{extends,T}`).
    Extending(String),
    /// Names a member of the given type tag.
    TagMember(String),
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Canonical spec of the field type, or `self.<target>` for self-refs.
    pub spec: String,
    /// Whether the field may be absent (nil union or literal nil type).
    pub optional: bool,
    /// Target field name when this field is a self-reference.
    pub self_ref: Option<String>,
    /// Resolved ancestor for self-reference fields; `None` means any
    /// registered type is acceptable.
    pub ancestor: Option<String>,
}

/// One slot of a tuple type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleSlot {
    /// Canonical spec of the slot type, or `self._N` for self-refs.
    pub spec: String,
    /// Zero-based target slot when this slot is a self-reference.
    pub self_ref: Option<usize>,
    pub ancestor: Option<String>,
}

/// Structural classification of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// A leaf type addressed by name (built-in scalar or restriction).
    Scalar,
    /// The unconstrained `table` type.
    Table,
    Array {
        elem: String,
    },
    Tuple {
        slots: Vec<TupleSlot>,
    },
    Map {
        key: String,
        value: String,
    },
    Record {
        fields: BTreeMap<String, FieldInfo>,
    },
    Union {
        members: Vec<String>,
    },
    /// Labels in original case, sorted by their case-folded form.
    Enum {
        labels: Vec<String>,
    },
}

impl TypeKind {
    /// The kind name exposed through introspection.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "name",
            TypeKind::Table => "table",
            TypeKind::Array { .. } => "array",
            TypeKind::Tuple { .. } => "tuple",
            TypeKind::Map { .. } => "map",
            TypeKind::Record { .. } => "record",
            TypeKind::Union { .. } => "union",
            TypeKind::Enum { .. } => "enum",
        }
    }
}

/// A registered type: canonical spec, structure, and naming behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub spec: String,
    pub kind: TypeKind,
    /// Set when values of this type are names of other types.
    pub naming: Option<TypeNaming>,
}

impl TypeEntry {
    pub fn new(spec: impl Into<String>, kind: TypeKind) -> Self {
        TypeEntry {
            spec: spec.into(),
            kind,
            naming: None,
        }
    }

    pub fn with_naming(mut self, naming: TypeNaming) -> Self {
        self.naming = Some(naming);
        self
    }
}
