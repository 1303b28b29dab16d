use std::collections::BTreeSet;

/// A parsed type spec.
///
/// Node kinds follow the type-spec grammar. Two braced forms are
/// disambiguated by shape: a single key/value pair is a [`Map`], two or
/// more pairs are a [`Record`]. The `{enum:a|b}` convention is
/// normalised to [`Enum`] during parsing so that canonical
/// serialisation can apply its label rules in one place.
///
/// [`Map`]: TypeAst::Map
/// [`Record`]: TypeAst::Record
/// [`Enum`]: TypeAst::Enum
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeAst {
    /// A (possibly dotted) type name.
    Name(String),
    /// The empty braces `{}`, an alias for `table`.
    Table,
    /// `{T}`: homogeneous array.
    Array(Box<TypeAst>),
    /// `{T1,T2,...}`: fixed-width tuple, two or more slots.
    Tuple(Vec<TypeAst>),
    /// `{K:V}`: homogeneous map.
    Map(Box<TypeAst>, Box<TypeAst>),
    /// `{a:T,b:U,...}`: record with named fields, in source order.
    Record(Vec<(String, TypeAst)>),
    /// `A|B|...`: union of alternatives, in source order.
    Union(Vec<TypeAst>),
    /// `{enum:A|B}`: enumeration labels in source order, original case.
    Enum(Vec<String>),
    /// `self.X`: a field whose value type comes from field `X`.
    SelfRef(String),
}

impl TypeAst {
    /// Render the canonical string form.
    ///
    /// Record fields are sorted by field name, enum labels are
    /// lower-cased, de-duplicated and sorted; all other node kinds
    /// preserve source order. The canonical form is stable: parsing it
    /// and canonicalising again yields the same string.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            TypeAst::Name(name) => out.push_str(name),
            TypeAst::Table => out.push_str("{}"),
            TypeAst::Array(elem) => {
                out.push('{');
                elem.write_canonical(out);
                out.push('}');
            }
            TypeAst::Tuple(slots) => {
                out.push('{');
                for (i, slot) in slots.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    slot.write_canonical(out);
                }
                out.push('}');
            }
            TypeAst::Map(key, value) => {
                out.push('{');
                key.write_canonical(out);
                out.push(':');
                value.write_canonical(out);
                out.push('}');
            }
            TypeAst::Record(fields) => {
                let mut sorted: Vec<&(String, TypeAst)> = fields.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                out.push('{');
                for (i, (name, spec)) in sorted.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(name);
                    out.push(':');
                    spec.write_canonical(out);
                }
                out.push('}');
            }
            TypeAst::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    member.write_canonical(out);
                }
            }
            TypeAst::Enum(labels) => {
                let folded: BTreeSet<String> =
                    labels.iter().map(|l| l.to_ascii_lowercase()).collect();
                out.push_str("{enum:");
                for (i, label) in folded.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    out.push_str(label);
                }
                out.push('}');
            }
            TypeAst::SelfRef(target) => {
                out.push_str("self.");
                out.push_str(target);
            }
        }
    }

    /// Whether this node is the plain name `name`.
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, TypeAst::Name(n) if n == name)
    }
}
