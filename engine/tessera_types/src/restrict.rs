//! The restriction API: deriving new named types from existing ones.
//!
//! Every operation registers a memoised parser under a generated
//! canonical name (content-addressed from the constraint, so equal
//! registrations collide on purpose). Re-registration with an identical
//! recipe is idempotent; with a different recipe it fails.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use regex::Regex;
use rustc_hash::FxHasher;
use tessera_diagnostic::{DiagnosticSink, ErrorKind};
use tessera_parse::{is_valid_name, TypeAst};
use tracing::debug;

use crate::build::{build_type, parse_type};
use crate::compare::{number_comparator, serialized_comparator, string_comparator};
use crate::contract::ParserRef;
use crate::entry::{TypeEntry, TypeFlags, TypeKind, TypeNaming};
use crate::expr::{ExprCompiler, ExprFailure, EXPR_COMPILE_QUOTA};
use crate::num::{format_integer, is_integral, SAFE_INT};
use crate::parsers::{
    ExpressionParser, RangeParser, StrRestrictParser, TagParser, TransformFn, TransformParser,
    TypeExtendingParser, ValidatorFn, ValidatorParser,
};
use crate::registry::{Comparator, NumberLimits, StrLimits, TypeRegistry};
use crate::subtype::same_or_extends;

/// Identifier-safe rendering of a bound for generated type names.
fn num_id(v: f64) -> String {
    if v == f64::INFINITY {
        return "inf".to_owned();
    }
    if v == f64::NEG_INFINITY {
        return "minf".to_owned();
    }
    let base = if is_integral(v) && v.abs() <= SAFE_INT {
        format_integer(v)
    } else {
        format!("{v}")
    };
    base.replace('-', "m").replace('.', "d")
}

/// Content hash for regex patterns and other opaque constraint sources.
fn content_id(text: &str) -> String {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}

enum NameClaim {
    Fresh,
    /// Identical re-registration: hand back the installed parser.
    Existing(ParserRef),
}

/// Check a derived type name: well-formed, and either fresh or already
/// registered with the same recipe.
fn claim_name(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    name: &str,
    recipe: &str,
) -> Option<NameClaim> {
    if !is_valid_name(name) {
        sink.error(ErrorKind::Parse, format!("`{name}` is not a valid type name"));
        return None;
    }
    if let Some(existing) = reg.recipe(name) {
        if existing == recipe {
            return reg.parser(name).map(NameClaim::Existing);
        }
        sink.error(
            ErrorKind::DuplicateName,
            format!("`{name}` is already registered with different semantics"),
        );
        return None;
    }
    if reg.has_parser(name) || reg.alias_target(name).is_some() {
        sink.error(ErrorKind::DuplicateName, format!("`{name}` is already taken"));
        return None;
    }
    Some(NameClaim::Fresh)
}

fn install_derived(
    reg: &mut TypeRegistry,
    name: &str,
    parent: &str,
    parser: ParserRef,
    entry: TypeEntry,
    comparator: Comparator,
    recipe: String,
    flags: TypeFlags,
) {
    debug!(name, parent, "installing restriction");
    reg.install_parser(name, parser);
    reg.set_entry(entry);
    reg.set_comparator(name, comparator);
    if !flags.is_empty() {
        reg.add_flags(name, flags);
    }
    reg.set_parent(name, parent);
    reg.set_recipe(name, recipe);
}

fn require_parent(
    reg: &TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
) -> Option<String> {
    let resolved = reg.resolve_alias(parent).to_owned();
    if reg.has_parser(&resolved) {
        Some(resolved)
    } else {
        sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{parent}`"));
        None
    }
}

/// Flags a restriction inherits from its parent.
fn inherited_flags(reg: &TypeRegistry, parent: &str) -> TypeFlags {
    reg.flags(parent) & (TypeFlags::NEVER_TABLE | TypeFlags::FORCE_STRING)
}

// === Numeric ranges ===

pub fn restrict_number(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    min: Option<f64>,
    max: Option<f64>,
    alias: Option<&str>,
) -> Option<(ParserRef, String)> {
    let parent = require_parent(reg, sink, parent)?;
    if !same_or_extends(reg, &parent, "number") {
        sink.error(
            ErrorKind::Parse,
            format!("`{parent}` is not a numeric type"),
        );
        return None;
    }
    let integerish = same_or_extends(reg, &parent, "integer");
    let inherited = reg.effective_number_limits(&parent);

    // Explicit bounds must respect the ancestors' range; defaulted
    // bounds are clamped into it silently.
    if let (Some(min), Some(limits)) = (min, inherited) {
        if min < limits.min {
            sink.error(
                ErrorKind::OutOfRange,
                format!("minimum {min} is below the minimum {} of `{parent}`", limits.min),
            );
            return None;
        }
    }
    if let (Some(max), Some(limits)) = (max, inherited) {
        if max > limits.max {
            sink.error(
                ErrorKind::OutOfRange,
                format!("maximum {max} is above the maximum {} of `{parent}`", limits.max),
            );
            return None;
        }
    }

    let wide_min = if integerish { -SAFE_INT } else { f64::NEG_INFINITY };
    let wide_max = if integerish { SAFE_INT } else { f64::INFINITY };
    let min = min.unwrap_or_else(|| inherited.map_or(wide_min, |l| l.min.max(wide_min)));
    let max = max.unwrap_or_else(|| inherited.map_or(wide_max, |l| l.max.min(wide_max)));

    if integerish && (!is_integral(min) || !is_integral(max)) {
        sink.error(
            ErrorKind::OutOfRange,
            "bounds of an integer restriction must be integers",
        );
        return None;
    }
    if min > max {
        sink.error(
            ErrorKind::OutOfRange,
            format!("minimum {min} is above maximum {max}"),
        );
        return None;
    }

    let name = format!("{parent}._R{}_{}", num_id(min), num_id(max));
    let recipe = format!("number:{parent}:{min}:{max}");
    let parser = match claim_name(reg, sink, &name, &recipe)? {
        NameClaim::Existing(parser) => parser,
        NameClaim::Fresh => {
            let limits = NumberLimits { min, max };
            let parser: ParserRef = Arc::new(RangeParser {
                spec: name.clone(),
                parent: parent.clone(),
                limits,
            });
            install_derived(
                reg,
                &name,
                &parent,
                parser.clone(),
                TypeEntry::new(name.clone(), TypeKind::Scalar),
                number_comparator(),
                recipe,
                TypeFlags::NEVER_TABLE,
            );
            reg.set_number_limits(name.clone(), limits);
            parser
        }
    };
    if let Some(alias) = alias {
        if !register_alias(reg, sink, alias, &name) {
            return None;
        }
    }
    Some((parser, name))
}

// === String restrictions ===

pub fn restrict_string(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    min_len: Option<usize>,
    max_len: Option<usize>,
    pattern: Option<&str>,
    alias: Option<&str>,
) -> Option<(ParserRef, String)> {
    let parent = require_parent(reg, sink, parent)?;
    if !same_or_extends(reg, &parent, "string") {
        sink.error(ErrorKind::Parse, format!("`{parent}` is not a string type"));
        return None;
    }
    if min_len.is_none() && max_len.is_none() && pattern.is_none() {
        sink.error(
            ErrorKind::Parse,
            "a string restriction needs a length bound or a pattern",
        );
        return None;
    }

    let regex = match pattern {
        None => None,
        Some(pattern) => match Regex::new(&format!("^(?:{pattern})$")) {
            Ok(regex) => Some(regex),
            Err(err) => {
                sink.error(ErrorKind::Parse, format!("invalid pattern: {err}"));
                return None;
            }
        },
    };

    // Intersect with inherited bounds to catch contradictions early;
    // the parent delegation enforces them at parse time regardless.
    let (inherited_min, inherited_max) = reg.effective_str_lengths(&parent);
    let eff_min = match (min_len, inherited_min) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    let eff_max = match (max_len, inherited_max) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    if let (Some(lo), Some(hi)) = (eff_min, eff_max) {
        if lo > hi {
            sink.error(
                ErrorKind::OutOfRange,
                format!("minimum length {lo} is above maximum length {hi}"),
            );
            return None;
        }
    }

    let len_id = format!(
        "{}_{}",
        min_len.map_or("x".to_owned(), |v| v.to_string()),
        max_len.map_or("x".to_owned(), |v| v.to_string()),
    );
    let regex_id = pattern.map_or("x".to_owned(), content_id);
    let name = format!("{parent}._RS{len_id}_RE_{regex_id}");
    let recipe = format!("string:{parent}:{min_len:?}:{max_len:?}:{pattern:?}");

    let parser = match claim_name(reg, sink, &name, &recipe)? {
        NameClaim::Existing(parser) => parser,
        NameClaim::Fresh => {
            let parser: ParserRef = Arc::new(StrRestrictParser {
                spec: name.clone(),
                parent: parent.clone(),
                min_len,
                max_len,
                regex: regex.clone(),
            });
            install_derived(
                reg,
                &name,
                &parent,
                parser.clone(),
                TypeEntry::new(name.clone(), TypeKind::Scalar),
                string_comparator(),
                recipe,
                TypeFlags::NEVER_TABLE,
            );
            reg.set_str_limits(
                name.clone(),
                StrLimits {
                    min_len,
                    max_len,
                    pattern: pattern.map(str::to_owned),
                    regex,
                },
            );
            parser
        }
    };
    if let Some(alias) = alias {
        if !register_alias(reg, sink, alias, &name) {
            return None;
        }
    }
    Some((parser, name))
}

// === Enum subsets ===

pub fn restrict_enum(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    labels: &[String],
    alias: Option<&str>,
) -> Option<(ParserRef, String)> {
    let parent = require_parent(reg, sink, parent)?;
    let parent_labels = match reg.entry(&parent).map(|e| &e.kind) {
        Some(TypeKind::Enum { labels }) => labels.clone(),
        _ => {
            sink.error(ErrorKind::Parse, format!("`{parent}` is not an enum"));
            return None;
        }
    };

    let mut kept: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let Some(original) = parent_labels
            .iter()
            .find(|existing| existing.eq_ignore_ascii_case(label))
        else {
            sink.error(
                ErrorKind::EnumLabel,
                format!("`{label}` is not a label of `{parent}`"),
            );
            return None;
        };
        if !kept.iter().any(|l| l.eq_ignore_ascii_case(original)) {
            kept.push(original.clone());
        }
    }

    let (parser, spec) = build_type(reg, sink, &TypeAst::Enum(kept))?;
    if spec != parent && reg.parent_of(&spec).is_none() {
        reg.set_parent(spec.clone(), parent);
    }
    if let Some(alias) = alias {
        if !register_alias(reg, sink, alias, &spec) {
            return None;
        }
    }
    Some((parser, spec))
}

// === Union subsets ===

pub fn restrict_union(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    allowed: &[String],
    alias: Option<&str>,
) -> Option<(ParserRef, String)> {
    let parent = require_parent(reg, sink, parent)?;
    let members = match reg.entry(&parent).map(|e| &e.kind) {
        Some(TypeKind::Union { members }) => members.clone(),
        _ => {
            sink.error(ErrorKind::Parse, format!("`{parent}` is not a union"));
            return None;
        }
    };

    let mut allowed_specs = Vec::with_capacity(allowed.len());
    for spec in allowed {
        let (_, canonical) = parse_type(reg, sink, spec)?;
        if !members.contains(&canonical) {
            sink.error(
                ErrorKind::UnionMember,
                format!("`{canonical}` is not a member of `{parent}`"),
            );
            return None;
        }
        allowed_specs.push(canonical);
    }

    // Keep the parent's member order: nil, if kept, stays last.
    let kept: Vec<String> = members
        .iter()
        .filter(|m| allowed_specs.contains(m))
        .cloned()
        .collect();
    if kept.is_empty() {
        sink.error(ErrorKind::UnionMember, "a union restriction needs at least one member");
        return None;
    }

    let new_spec = kept.join("|");
    if new_spec == parent {
        let parser = reg.parser(&parent)?;
        return Some((parser, parent));
    }
    let (parser, spec) = parse_type(reg, sink, &new_spec)?;
    if spec != parent && reg.parent_of(&spec).is_none() {
        reg.set_parent(spec.clone(), parent);
    }
    if let Some(alias) = alias {
        if !register_alias(reg, sink, alias, &spec) {
            return None;
        }
    }
    Some((parser, spec))
}

// === Expression validators ===

pub fn restrict_with_expression(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    compiler: Option<&Arc<dyn ExprCompiler>>,
    parent: &str,
    name: &str,
    source: &str,
) -> Option<ParserRef> {
    let parent = require_parent(reg, sink, parent)?;
    let recipe = format!("expr:{parent}:{source}");
    match claim_name(reg, sink, name, &recipe)? {
        NameClaim::Existing(parser) => Some(parser),
        NameClaim::Fresh => {
            let Some(compiler) = compiler else {
                sink.error(
                    ErrorKind::ExpressionCompile,
                    "no expression engine is installed",
                );
                return None;
            };
            let expr = match compiler.compile(source, EXPR_COMPILE_QUOTA) {
                Ok(expr) => expr,
                Err(ExprFailure::Quota) => {
                    sink.error(
                        ErrorKind::Quota,
                        format!("validator source of `{name}` exhausted the compile quota"),
                    );
                    return None;
                }
                Err(err) => {
                    sink.error(ErrorKind::ExpressionCompile, err.to_string());
                    return None;
                }
            };
            let flags = inherited_flags(reg, &parent);
            let comparator = reg.comparator(&parent).unwrap_or_else(serialized_comparator);
            let parser: ParserRef = Arc::new(ExpressionParser {
                spec: name.to_owned(),
                parent: parent.clone(),
                expr,
            });
            install_derived(
                reg,
                name,
                &parent,
                parser.clone(),
                TypeEntry::new(name.to_owned(), TypeKind::Scalar),
                comparator,
                recipe,
                flags,
            );
            Some(parser)
        }
    }
}

/// Restriction by a native predicate. Unlike expression validators the
/// predicate cannot be compared, so re-registration always fails.
pub fn restrict_with_validator(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    name: &str,
    predicate: ValidatorFn,
) -> Option<ParserRef> {
    let parent = require_parent(reg, sink, parent)?;
    if !is_valid_name(name) {
        sink.error(ErrorKind::Parse, format!("`{name}` is not a valid type name"));
        return None;
    }
    if reg.has_parser(name) || reg.alias_target(name).is_some() {
        sink.error(ErrorKind::DuplicateName, format!("`{name}` is already taken"));
        return None;
    }
    let flags = inherited_flags(reg, &parent);
    let comparator = reg.comparator(&parent).unwrap_or_else(serialized_comparator);
    let parser: ParserRef = Arc::new(ValidatorParser {
        spec: name.to_owned(),
        parent: parent.clone(),
        predicate,
    });
    install_derived(
        reg,
        name,
        &parent,
        parser.clone(),
        TypeEntry::new(name.to_owned(), TypeKind::Scalar),
        comparator,
        format!("validator:{parent}:{name}"),
        flags,
    );
    Some(parser)
}

/// Derive a type whose parser post-processes the parent's result.
pub fn extend_parser(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    name: &str,
    transform: TransformFn,
) -> Option<ParserRef> {
    let parent = require_parent(reg, sink, parent)?;
    if !is_valid_name(name) {
        sink.error(ErrorKind::Parse, format!("`{name}` is not a valid type name"));
        return None;
    }
    if reg.has_parser(name) || reg.alias_target(name).is_some() {
        sink.error(ErrorKind::DuplicateName, format!("`{name}` is already taken"));
        return None;
    }
    let flags = inherited_flags(reg, &parent);
    let comparator = reg.comparator(&parent).unwrap_or_else(serialized_comparator);
    let parser: ParserRef = Arc::new(TransformParser {
        parent: parent.clone(),
        transform,
    });
    install_derived(
        reg,
        name,
        &parent,
        parser.clone(),
        TypeEntry::new(name.to_owned(), TypeKind::Scalar),
        comparator,
        format!("transform:{parent}:{name}"),
        flags,
    );
    Some(parser)
}

// === Ancestor-constrained type names ===

pub fn restrict_to_type_extending(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    parent: &str,
    name: &str,
    ancestor: &str,
) -> Option<ParserRef> {
    let parent = require_parent(reg, sink, parent)?;
    if !same_or_extends(reg, &parent, "string") {
        sink.error(ErrorKind::Parse, format!("`{parent}` is not a string type"));
        return None;
    }
    let ancestor = require_parent(reg, sink, ancestor)?;
    let recipe = format!("extending:{parent}:{ancestor}");
    match claim_name(reg, sink, name, &recipe)? {
        NameClaim::Existing(parser) => Some(parser),
        NameClaim::Fresh => {
            let parser: ParserRef = Arc::new(TypeExtendingParser {
                spec: name.to_owned(),
                parent: parent.clone(),
                ancestor: ancestor.clone(),
            });
            install_derived(
                reg,
                name,
                &parent,
                parser.clone(),
                TypeEntry::new(name.to_owned(), TypeKind::Scalar)
                    .with_naming(TypeNaming::Extending(ancestor)),
                string_comparator(),
                recipe,
                TypeFlags::NEVER_TABLE,
            );
            Some(parser)
        }
    }
}

// === Aliases, enums, tags ===

pub fn register_alias(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    name: &str,
    spec: &str,
) -> bool {
    if !is_valid_name(name) {
        sink.error(ErrorKind::Parse, format!("`{name}` is not a valid type name"));
        return false;
    }
    let Some((_, canonical)) = parse_type(reg, sink, spec) else {
        return false;
    };
    if let Some(existing) = reg.alias_target(name) {
        if existing == canonical {
            return true;
        }
        sink.error(
            ErrorKind::DuplicateName,
            format!("`{name}` already aliases `{existing}`"),
        );
        return false;
    }
    if reg.has_parser(name) {
        if name == canonical {
            return true;
        }
        sink.error(ErrorKind::DuplicateName, format!("`{name}` is already a type"));
        return false;
    }
    reg.set_alias(name, canonical);
    true
}

pub fn register_enum_parser(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    labels: &[String],
    name: Option<&str>,
) -> Option<(ParserRef, String)> {
    let (parser, spec) = build_type(reg, sink, &TypeAst::Enum(labels.to_vec()))?;
    if let Some(name) = name {
        if !register_alias(reg, sink, name, &spec) {
            return None;
        }
    }
    Some((parser, spec))
}

/// Register a named set of member types. The tag doubles as a type
/// whose values are member names.
pub fn register_type_tag(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    tag: &str,
    members: &[String],
) -> bool {
    if !is_valid_name(tag) {
        sink.error(ErrorKind::Parse, format!("`{tag}` is not a valid tag name"));
        return false;
    }
    let mut resolved = std::collections::BTreeSet::new();
    for member in members {
        let canonical = reg.resolve_alias(member).to_owned();
        if !reg.has_parser(&canonical) && !reg.is_tag(&canonical) {
            sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{member}`"));
            return false;
        }
        resolved.insert(canonical);
    }
    if let Some(existing) = reg.tag_members(tag) {
        if *existing == resolved {
            return true;
        }
        sink.error(
            ErrorKind::DuplicateName,
            format!("tag `{tag}` is already registered with different members"),
        );
        return false;
    }
    if reg.has_parser(tag) {
        sink.error(ErrorKind::DuplicateName, format!("`{tag}` is already a type"));
        return false;
    }

    let ancestor = common_ancestor(reg, &resolved);
    reg.set_tag(tag, resolved, ancestor);
    reg.install_parser(tag, Arc::new(TagParser { tag: tag.to_owned() }));
    reg.set_entry(
        TypeEntry::new(tag.to_owned(), TypeKind::Scalar)
            .with_naming(TypeNaming::TagMember(tag.to_owned())),
    );
    reg.add_flags(tag, TypeFlags::NEVER_TABLE);
    reg.set_comparator(tag, string_comparator());
    true
}

/// Deepest type present in every member's extends chain (including the
/// member itself).
fn common_ancestor(
    reg: &TypeRegistry,
    members: &std::collections::BTreeSet<String>,
) -> Option<String> {
    let mut iter = members.iter();
    let first = iter.next()?;
    let first_chain = ancestor_chain(reg, first);
    let other_chains: Vec<Vec<String>> = iter.map(|m| ancestor_chain(reg, m)).collect();
    first_chain
        .into_iter()
        .find(|candidate| other_chains.iter().all(|chain| chain.contains(candidate)))
}

fn ancestor_chain(reg: &TypeRegistry, ty: &str) -> Vec<String> {
    let mut chain = vec![reg.resolve_alias(ty).to_owned()];
    let mut hops = 0;
    while let Some(parent) = reg.parent_of(chain[chain.len() - 1].as_str()) {
        chain.push(parent.to_owned());
        hops += 1;
        if hops > 64 {
            break;
        }
    }
    chain
}
