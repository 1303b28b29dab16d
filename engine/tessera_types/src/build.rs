//! The type constructor: AST in, installed value parser out.
//!
//! Construction is memoised on canonical spec strings. Children are
//! fully installed before their parent publishes, and failed specs go
//! into the `unknown_types` negative cache so the same error is never
//! reported twice.

use std::collections::BTreeMap;
use std::sync::Arc;

use tessera_diagnostic::{DiagnosticSink, ErrorKind};
use tessera_parse::{is_keyword, is_reserved, is_slot_name, parse_spec, TypeAst};
use tracing::debug;

use crate::compare::{
    enum_comparator, map_comparator, nil_aware_comparator, sequence_comparator,
    serialized_comparator, string_comparator, tuple_comparator,
};
use crate::contract::ParserRef;
use crate::entry::{FieldInfo, TupleSlot, TypeEntry, TypeFlags, TypeKind, TypeNaming};
use crate::parsers::{
    ArrayParser, BareExtendsParser, EnumParser, MapParser, RecordParser, TupleParser, UnionParser,
};
use crate::registry::{Comparator, TypeRegistry};
use crate::subtype::same_or_extends;

/// Parse a type-spec string and build its parser.
///
/// The requested spelling is memoised as an alias of the canonical
/// spec, so later lookups may use either form.
pub fn parse_type(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    spec: &str,
) -> Option<(ParserRef, String)> {
    match parse_spec(spec) {
        Ok(ast) => {
            let (parser, resolved) = build_type(reg, sink, &ast)?;
            let requested = spec.trim();
            if requested != resolved
                && !reg.has_parser(requested)
                && reg.alias_target(requested).is_none()
            {
                reg.set_alias(requested, resolved.clone());
            }
            Some((parser, resolved))
        }
        Err(err) => {
            sink.error(ErrorKind::Parse, format!("bad type spec: {err}"));
            None
        }
    }
}

/// Build (or fetch) the parser for an AST.
///
/// Returns the parser together with the canonical spec it is installed
/// under. Returns `None` after logging, or silently when the spec is
/// already in the negative cache.
pub fn build_type(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    ast: &TypeAst,
) -> Option<(ParserRef, String)> {
    let spec = ast.canonical();
    if let Some(parser) = reg.parser(&spec) {
        let resolved = reg.resolve_alias(&spec).to_owned();
        warn_bare_number(reg, sink, &resolved);
        return Some((parser, resolved));
    }
    if reg.is_unknown(&spec) {
        return None;
    }
    let built = build_uncached(reg, sink, ast, &spec);
    if built.is_none() {
        reg.mark_unknown(spec);
    }
    built
}

/// Bare `number` gives no precision guidance; nudge towards a sized
/// type, once per source.
fn warn_bare_number(reg: &mut TypeRegistry, sink: &mut DiagnosticSink, resolved: &str) {
    if resolved != "number" || reg.is_setting_up() {
        return;
    }
    let source = sink.source().unwrap_or("").to_owned();
    if reg.should_warn_bare_number(&source) {
        sink.warning(
            ErrorKind::Parse,
            "bare `number` is deprecated; use `integer`, `float` or `long`",
        );
    }
}

fn build_uncached(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    ast: &TypeAst,
    spec: &str,
) -> Option<(ParserRef, String)> {
    match ast {
        TypeAst::Name(name) => {
            sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{name}`"));
            None
        }
        TypeAst::Table => {
            let parser = reg.parser("table")?;
            Some((parser, "table".to_owned()))
        }
        TypeAst::Array(elem) => build_array(reg, sink, elem, spec),
        TypeAst::Tuple(slots) => build_tuple(reg, sink, slots, spec),
        TypeAst::Map(key, value) => build_map(reg, sink, key, value, spec),
        TypeAst::Record(fields) => build_record(reg, sink, fields, spec),
        TypeAst::Union(members) => build_union(reg, sink, members, spec),
        TypeAst::Enum(labels) => build_enum(reg, sink, labels, spec),
        TypeAst::SelfRef(_) => {
            sink.error(
                ErrorKind::SelfRef,
                "a self-reference can only appear inside a tuple or record",
            );
            None
        }
    }
}

/// Install a freshly built parser under its resolved canonical spec,
/// aliasing the requested spelling when it differs.
fn publish(
    reg: &mut TypeRegistry,
    requested: &str,
    resolved: String,
    parser: ParserRef,
    entry: TypeEntry,
    comparator: Comparator,
    flags: TypeFlags,
) -> Option<(ParserRef, String)> {
    if !reg.has_parser(&resolved) {
        debug!(spec = %resolved, "installing type");
        reg.install_parser(resolved.clone(), parser.clone());
        reg.set_entry(entry);
        reg.set_comparator(resolved.clone(), comparator);
        if !flags.is_empty() {
            reg.add_flags(&resolved, flags);
        }
    }
    if requested != resolved {
        reg.set_alias(requested, resolved.clone());
    }
    let installed = reg.parser(&resolved)?;
    Some((installed, resolved))
}

fn child_comparator(reg: &TypeRegistry, spec: &str) -> Comparator {
    reg.comparator(spec).unwrap_or_else(serialized_comparator)
}

// === Arrays ===

fn build_array(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    elem: &TypeAst,
    spec: &str,
) -> Option<(ParserRef, String)> {
    let (_, elem_spec) = build_type(reg, sink, elem)?;
    let resolved = format!("{{{elem_spec}}}");
    let parser: ParserRef = Arc::new(ArrayParser {
        spec: resolved.clone(),
        elem: elem_spec.clone(),
    });
    let entry = TypeEntry::new(
        resolved.clone(),
        TypeKind::Array {
            elem: elem_spec.clone(),
        },
    );
    let comparator = sequence_comparator(child_comparator(reg, &elem_spec));
    publish(reg, spec, resolved, parser, entry, comparator, TypeFlags::empty())
}

// === Maps ===

fn build_map(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    key: &TypeAst,
    value: &TypeAst,
    spec: &str,
) -> Option<(ParserRef, String)> {
    // `{enum:a|b}` and `{extends:T}` are spelled as single-pair maps;
    // the parser normalises the former, but constructed ASTs may still
    // arrive here.
    if key.is_name("enum") {
        let members: Vec<&TypeAst> = match value {
            TypeAst::Union(members) => members.iter().collect(),
            single => vec![single],
        };
        let mut labels = Vec::with_capacity(members.len());
        for member in members {
            match member {
                TypeAst::Name(label) => labels.push(label.clone()),
                _ => {
                    sink.error(ErrorKind::EnumLabel, "enum labels must be identifiers");
                    return None;
                }
            }
        }
        return build_enum(reg, sink, &labels, spec);
    }
    if key.is_name("extends") {
        let tuple = TypeAst::Tuple(vec![TypeAst::Name("extends".to_owned()), value.clone()]);
        let (parser, resolved) = build_type(reg, sink, &tuple)?;
        reg.set_alias(spec, resolved.clone());
        return Some((parser, resolved));
    }

    let (_, key_spec) = build_type(reg, sink, key)?;
    let (_, value_spec) = build_type(reg, sink, value)?;

    if key_spec == "nil" || value_spec == "nil" {
        sink.error(ErrorKind::Parse, "map key and value types may not be nil");
        return None;
    }
    if !reg.has_flag(&key_spec, TypeFlags::NEVER_TABLE) {
        sink.error(
            ErrorKind::Parse,
            format!("map key type `{key_spec}` must be a scalar type"),
        );
        return None;
    }

    let resolved = format!("{{{key_spec}:{value_spec}}}");
    let parser: ParserRef = Arc::new(MapParser {
        spec: resolved.clone(),
        key: key_spec.clone(),
        value: value_spec.clone(),
    });
    let entry = TypeEntry::new(
        resolved.clone(),
        TypeKind::Map {
            key: key_spec.clone(),
            value: value_spec.clone(),
        },
    );
    let comparator = map_comparator(
        child_comparator(reg, &key_spec),
        child_comparator(reg, &value_spec),
    );
    publish(reg, spec, resolved, parser, entry, comparator, TypeFlags::empty())
}

// === Unions ===

fn build_union(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    members: &[TypeAst],
    spec: &str,
) -> Option<(ParserRef, String)> {
    let mut specs: Vec<String> = Vec::with_capacity(members.len());
    for member in members {
        let (_, member_spec) = build_type(reg, sink, member)?;
        // An alias may itself resolve to a union: flatten it.
        for part in member_spec.split('|') {
            if !specs.iter().any(|existing| existing == part) {
                specs.push(part.to_owned());
            }
        }
    }
    if specs.len() == 1 {
        let only = &specs[0];
        let parser = reg.parser(only)?;
        let resolved = only.clone();
        if spec != resolved {
            reg.set_alias(spec, resolved.clone());
        }
        return Some((parser, resolved));
    }

    let resolved = specs.join("|");

    // Ambiguity ordering: nil last, string last among non-nil members.
    // Violations are diagnosed but the parser is still returned.
    if let Some(nil_pos) = specs.iter().position(|s| s == "nil") {
        if nil_pos + 1 != specs.len() {
            sink.warning(
                ErrorKind::UnionMember,
                format!("nil member of `{resolved}` should be last"),
            );
        }
    }
    if let Some(string_pos) = specs.iter().position(|s| s == "string") {
        let last_non_nil = specs.iter().rposition(|s| s != "nil");
        let non_nil_count = specs.iter().filter(|s| *s != "nil").count();
        if non_nil_count > 1 && last_non_nil != Some(string_pos) {
            sink.warning(
                ErrorKind::UnionMember,
                format!("`string` member of `{resolved}` should be the last non-nil member"),
            );
        }
    }

    let optional = specs.iter().any(|s| s == "nil");
    let all_never_table = specs
        .iter()
        .all(|s| reg.has_flag(s, TypeFlags::NEVER_TABLE));

    let mut flags = TypeFlags::empty();
    if optional {
        flags |= TypeFlags::OPTIONAL | TypeFlags::NIL_UNION;
    }
    if all_never_table {
        flags |= TypeFlags::NEVER_TABLE;
    }

    reg.set_union_first_type(resolved.clone(), specs[0].clone());

    let comparator = if optional && specs.len() == 2 {
        let other = specs.iter().find(|s| *s != "nil").cloned();
        match other {
            Some(other) => nil_aware_comparator(child_comparator(reg, &other)),
            None => serialized_comparator(),
        }
    } else {
        serialized_comparator()
    };

    let parser: ParserRef = Arc::new(UnionParser {
        spec: resolved.clone(),
        members: specs.clone(),
        optional,
    });
    let entry = TypeEntry::new(resolved.clone(), TypeKind::Union { members: specs });
    publish(reg, spec, resolved, parser, entry, comparator, flags)
}

// === Enums ===

fn build_enum(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    labels: &[String],
    spec: &str,
) -> Option<(ParserRef, String)> {
    if labels.is_empty() {
        sink.error(ErrorKind::EnumLabel, "an enum needs at least one label");
        return None;
    }
    let mut sorted: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if is_keyword(label) || is_reserved(label) || is_slot_name(label) {
            sink.error(
                ErrorKind::EnumLabel,
                format!("`{label}` is not allowed as an enum label"),
            );
            return None;
        }
        if sorted
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(label))
        {
            sink.error(
                ErrorKind::DuplicateName,
                format!("duplicate enum label `{label}`"),
            );
            return None;
        }
        sorted.push(label.clone());
    }
    sorted.sort_by_key(|label| label.to_ascii_lowercase());

    let folded: Vec<String> = sorted.iter().map(|l| l.to_ascii_lowercase()).collect();
    let resolved = format!("{{enum:{}}}", folded.join("|"));

    let parser: ParserRef = Arc::new(EnumParser {
        spec: resolved.clone(),
        labels: sorted.clone(),
    });
    let entry = TypeEntry::new(resolved.clone(), TypeKind::Enum { labels: sorted });
    publish(
        reg,
        spec,
        resolved,
        parser,
        entry,
        enum_comparator(),
        TypeFlags::NEVER_TABLE,
    )
}

// === Tuples ===

fn build_tuple(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    slots: &[TypeAst],
    spec: &str,
) -> Option<(ParserRef, String)> {
    if slots.first().is_some_and(|s| s.is_name("extends")) {
        return build_tuple_extends(reg, sink, slots, spec);
    }

    let mut built: Vec<TupleSlot> = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            TypeAst::SelfRef(target) => built.push(TupleSlot {
                spec: format!("self.{target}"),
                self_ref: Some(usize::MAX), // resolved below
                ancestor: None,
            }),
            other => {
                let (_, slot_spec) = build_type(reg, sink, other)?;
                built.push(TupleSlot {
                    spec: slot_spec,
                    self_ref: None,
                    ancestor: None,
                });
            }
        }
    }
    resolve_tuple_self_refs(reg, sink, &mut built)?;
    let specs: Vec<&str> = built.iter().map(|s| s.spec.as_str()).collect();
    let resolved = format!("{{{}}}", specs.join(","));
    finish_tuple_with_spec(reg, spec, resolved, built)
}

/// `{extends,Parent,F3,...}`: with one extra element this is the bare
/// form (a string naming a type extending `Parent`); with more, the
/// parent's slots are prepended to the extra slots.
fn build_tuple_extends(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    slots: &[TypeAst],
    spec: &str,
) -> Option<(ParserRef, String)> {
    if slots.len() == 2 {
        let (_, ancestor) = build_type(reg, sink, &slots[1])?;
        let resolved = format!("{{extends,{ancestor}}}");
        let parser: ParserRef = Arc::new(BareExtendsParser {
            spec: resolved.clone(),
            ancestor: ancestor.clone(),
        });
        let entry = TypeEntry::new(resolved.clone(), TypeKind::Scalar)
            .with_naming(TypeNaming::Extending(ancestor));
        return publish(
            reg,
            spec,
            resolved,
            parser,
            entry,
            string_comparator(),
            TypeFlags::NEVER_TABLE,
        );
    }

    let (_, parent_spec) = build_type(reg, sink, &slots[1])?;
    let parent_slots = match reg.entry(&parent_spec).map(|e| &e.kind) {
        Some(TypeKind::Tuple { slots }) => slots.clone(),
        _ => {
            sink.error(
                ErrorKind::Parse,
                format!("tuple extension parent `{parent_spec}` is not a tuple"),
            );
            return None;
        }
    };

    // Parent slots come first; the child only appends, it cannot
    // redeclare a parent slot.
    let mut built = parent_slots;
    let mut extra_specs: Vec<String> = Vec::new();
    for slot in &slots[2..] {
        match slot {
            TypeAst::SelfRef(target) => {
                built.push(TupleSlot {
                    spec: format!("self.{target}"),
                    self_ref: Some(usize::MAX),
                    ancestor: None,
                });
                extra_specs.push(format!("self.{target}"));
            }
            other => {
                let (_, slot_spec) = build_type(reg, sink, other)?;
                built.push(TupleSlot {
                    spec: slot_spec.clone(),
                    self_ref: None,
                    ancestor: None,
                });
                extra_specs.push(slot_spec);
            }
        }
    }
    resolve_tuple_self_refs(reg, sink, &mut built)?;

    let resolved = format!("{{extends,{parent_spec},{}}}", extra_specs.join(","));
    let result = finish_tuple_with_spec(reg, spec, resolved, built);
    if let Some((_, child_spec)) = &result {
        if child_spec != &parent_spec {
            reg.set_parent(child_spec.clone(), parent_spec);
        }
    }
    result
}

/// Resolve `self._N` targets and assign ancestors, after all slots are
/// known.
fn resolve_tuple_self_refs(
    reg: &TypeRegistry,
    sink: &mut DiagnosticSink,
    built: &mut [TupleSlot],
) -> Option<()> {
    let snapshot = built.to_vec();
    for (index, slot) in built.iter_mut().enumerate() {
        if slot.self_ref.is_none() {
            continue;
        }
        let Some(target_name) = slot.spec.strip_prefix("self.") else {
            continue;
        };
        if !is_slot_name(target_name) {
            sink.error(
                ErrorKind::SelfRef,
                format!("tuple self-reference target must be a slot, got `{target_name}`"),
            );
            return None;
        }
        let target: usize = match target_name[1..].parse() {
            Ok(target) => target,
            Err(_) => {
                sink.error(
                    ErrorKind::SelfRef,
                    format!("self-reference target `{target_name}` is not a valid slot"),
                );
                return None;
            }
        };
        if target == 0 || target > snapshot.len() {
            sink.error(
                ErrorKind::SelfRef,
                format!("self-reference target `_{target}` is out of range"),
            );
            return None;
        }
        let target_index = target - 1;
        if target_index == index {
            sink.error(ErrorKind::SelfRef, "a self-reference may not reference itself");
            return None;
        }
        let target_slot = &snapshot[target_index];
        if target_slot.self_ref.is_some() {
            sink.error(
                ErrorKind::SelfRef,
                "a self-reference may not reference another self-reference",
            );
            return None;
        }
        let ancestor = match naming_ancestor(reg, &target_slot.spec) {
            Ok(ancestor) => ancestor,
            Err(()) => {
                sink.error(
                    ErrorKind::SelfRef,
                    format!(
                        "self-reference target `{}` does not produce type names",
                        target_slot.spec
                    ),
                );
                return None;
            }
        };
        slot.self_ref = Some(target_index);
        slot.ancestor = ancestor;
    }
    Some(())
}

/// The ancestor implied by a name-producing type, or `Err` when the
/// type does not produce type names at all.
fn naming_ancestor(reg: &TypeRegistry, target_spec: &str) -> Result<Option<String>, ()> {
    match reg.entry(target_spec).and_then(|e| e.naming.clone()) {
        Some(TypeNaming::Any) => Ok(None),
        Some(TypeNaming::Extending(ancestor)) => Ok(Some(ancestor)),
        Some(TypeNaming::TagMember(tag)) => Ok(reg.tag_ancestor(&tag).map(str::to_owned)),
        None => Err(()),
    }
}

fn finish_tuple_with_spec(
    reg: &mut TypeRegistry,
    requested: &str,
    resolved: String,
    slots: Vec<TupleSlot>,
) -> Option<(ParserRef, String)> {
    let comparators: Vec<Comparator> = slots
        .iter()
        .map(|slot| match (&slot.self_ref, &slot.ancestor) {
            (Some(_), Some(ancestor)) => child_comparator(reg, ancestor),
            (Some(_), None) => serialized_comparator(),
            (None, _) => child_comparator(reg, &slot.spec),
        })
        .collect();
    let parser: ParserRef = Arc::new(TupleParser {
        spec: resolved.clone(),
        slots: slots.clone(),
    });
    let entry = TypeEntry::new(resolved.clone(), TypeKind::Tuple { slots });
    publish(
        reg,
        requested,
        resolved,
        parser,
        entry,
        tuple_comparator(comparators),
        TypeFlags::empty(),
    )
}

// === Records ===

fn build_record(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    fields: &[(String, TypeAst)],
    spec: &str,
) -> Option<(ParserRef, String)> {
    let extends_ast = fields
        .iter()
        .find(|(name, _)| name == "extends")
        .map(|(_, ast)| ast);

    // Inherited fields come in first; the child may narrow or suppress.
    let (mut built, parent_spec) = match extends_ast {
        Some(parent_ast) => {
            let (_, parent_spec) = build_type(reg, sink, parent_ast)?;
            match reg.entry(&parent_spec).map(|e| &e.kind) {
                Some(TypeKind::Record { fields }) => (fields.clone(), Some(parent_spec)),
                _ => {
                    sink.error(
                        ErrorKind::Parse,
                        format!("record extension parent `{parent_spec}` is not a record"),
                    );
                    return None;
                }
            }
        }
        None => (BTreeMap::new(), None),
    };

    // Canonical spelling of the declaration, with child specs resolved.
    let mut declared: Vec<(String, String)> = Vec::with_capacity(fields.len());
    if let Some(parent) = &parent_spec {
        declared.push(("extends".to_owned(), parent.clone()));
    }

    for (name, field_ast) in fields {
        if name == "extends" {
            continue;
        }
        if is_keyword(name) || is_reserved(name) || is_slot_name(name) {
            sink.error(
                ErrorKind::Parse,
                format!("`{name}` is not allowed as a record field name"),
            );
            return None;
        }

        let field = match field_ast {
            TypeAst::SelfRef(target) => {
                declared.push((name.clone(), format!("self.{target}")));
                FieldInfo {
                    spec: format!("self.{target}"),
                    optional: false,
                    self_ref: Some(target.clone()),
                    ancestor: None,
                }
            }
            other => {
                let (_, field_spec) = build_type(reg, sink, other)?;
                declared.push((name.clone(), field_spec.clone()));
                let optional = field_spec == "nil"
                    || reg.has_flag(&field_spec, TypeFlags::OPTIONAL);
                FieldInfo {
                    spec: field_spec,
                    optional,
                    self_ref: None,
                    ancestor: None,
                }
            }
        };

        match built.get(name) {
            None => {
                if field.spec == "nil" && parent_spec.is_none() {
                    sink.warning(
                        ErrorKind::Parse,
                        format!("field `{name}` is typed nil and can never hold a value"),
                    );
                }
                built.insert(name.clone(), field);
            }
            Some(inherited) => {
                if inherited.self_ref.is_some() {
                    sink.error(
                        ErrorKind::IncompatibleRedefinition,
                        format!("inherited self-reference field `{name}` may not be redefined"),
                    );
                    return None;
                }
                if field.spec == "nil" {
                    // Suppress the inherited field.
                    if !inherited.optional {
                        sink.warning(
                            ErrorKind::Parse,
                            format!("suppressed field `{name}` was not optional"),
                        );
                    }
                    built.remove(name);
                    continue;
                }
                if field.self_ref.is_some() {
                    sink.error(
                        ErrorKind::IncompatibleRedefinition,
                        format!("field `{name}` may not be redefined as a self-reference"),
                    );
                    return None;
                }
                if !same_or_extends(reg, &field.spec, &inherited.spec) {
                    sink.error(
                        ErrorKind::IncompatibleRedefinition,
                        format!(
                            "field `{name}` redefined as `{}`, which does not extend `{}`",
                            field.spec, inherited.spec
                        ),
                    );
                    return None;
                }
                built.insert(name.clone(), field);
            }
        }
    }

    resolve_record_self_refs(reg, sink, &mut built)?;

    declared.sort_by(|a, b| a.0.cmp(&b.0));
    let rendered: Vec<String> = declared
        .iter()
        .map(|(name, field_spec)| format!("{name}:{field_spec}"))
        .collect();
    let resolved = format!("{{{}}}", rendered.join(","));

    let parser: ParserRef = Arc::new(RecordParser {
        spec: resolved.clone(),
        fields: built.clone(),
    });
    let entry = TypeEntry::new(resolved.clone(), TypeKind::Record { fields: built });
    let result = publish(
        reg,
        spec,
        resolved,
        parser,
        entry,
        serialized_comparator(),
        TypeFlags::empty(),
    );
    if let (Some((_, child)), Some(parent)) = (&result, parent_spec) {
        if child != &parent {
            reg.set_parent(child.clone(), parent);
        }
    }
    result
}

fn resolve_record_self_refs(
    reg: &TypeRegistry,
    sink: &mut DiagnosticSink,
    built: &mut BTreeMap<String, FieldInfo>,
) -> Option<()> {
    let snapshot = built.clone();
    for (name, field) in built.iter_mut() {
        let Some(target) = field.self_ref.clone() else { continue };
        if target == *name {
            sink.error(ErrorKind::SelfRef, "a self-reference may not reference itself");
            return None;
        }
        let Some(target_field) = snapshot.get(&target) else {
            sink.error(
                ErrorKind::SelfRef,
                format!("self-reference target `{target}` is not a field"),
            );
            return None;
        };
        if target_field.self_ref.is_some() {
            sink.error(
                ErrorKind::SelfRef,
                "a self-reference may not reference another self-reference",
            );
            return None;
        }
        match naming_ancestor(reg, &target_field.spec) {
            Ok(ancestor) => field.ancestor = ancestor,
            Err(()) => {
                sink.error(
                    ErrorKind::SelfRef,
                    format!(
                        "self-reference target `{target}` does not produce type names"
                    ),
                );
                return None;
            }
        }
    }
    Some(())
}
