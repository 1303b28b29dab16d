//! The structural + nominal subtype relation.
//!
//! `extends_or_restrict` is the single source of truth for subtyping.
//! It is strict: a type never extends itself. Structural recursion is
//! guarded by a visited set, so recursive record shapes cannot loop.

use rustc_hash::FxHashSet;

use crate::entry::{FieldInfo, TupleSlot, TypeKind};
use crate::registry::TypeRegistry;

type Seen = FxHashSet<(String, String)>;

/// Whether `child` strictly extends (or restricts) `parent`.
pub fn extends_or_restrict(reg: &TypeRegistry, child: &str, parent: &str) -> bool {
    let child = reg.resolve_alias(child);
    let parent = reg.resolve_alias(parent);
    if child == parent {
        return false;
    }
    let mut seen = Seen::default();
    related(reg, child, parent, &mut seen)
}

/// Equal (after alias resolution) or extending.
pub fn same_or_extends(reg: &TypeRegistry, child: &str, parent: &str) -> bool {
    reg.resolve_alias(child) == reg.resolve_alias(parent)
        || extends_or_restrict(reg, child, parent)
}

/// Whether `ty` belongs to `tag`, directly, through a nested tag, or
/// through its extends chain reaching a member.
pub fn is_member_of_tag(reg: &TypeRegistry, ty: &str, tag: &str) -> bool {
    let ty = reg.resolve_alias(ty);
    let mut seen = Seen::default();
    tag_contains(reg, tag, ty, &mut seen)
}

/// All members of `tag`, with nested tags expanded. Sorted.
pub fn list_members_of_tag(reg: &TypeRegistry, tag: &str) -> Option<Vec<String>> {
    reg.tag_members(tag)?;
    let mut out = FxHashSet::default();
    let mut pending = vec![tag.to_owned()];
    let mut visited = FxHashSet::default();
    while let Some(current) = pending.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(members) = reg.tag_members(&current) else { continue };
        for member in members {
            if reg.is_tag(member) {
                pending.push(member.clone());
            } else {
                out.insert(member.clone());
            }
        }
    }
    let mut members: Vec<String> = out.into_iter().collect();
    members.sort_unstable();
    Some(members)
}

/// Inner relation: equality counts (structural recursion needs
/// equal-or-extends at every position).
fn related(reg: &TypeRegistry, child: &str, parent: &str, seen: &mut Seen) -> bool {
    let child = reg.resolve_alias(child);
    let parent = reg.resolve_alias(parent);
    if child == parent {
        return true;
    }
    if !seen.insert((child.to_owned(), parent.to_owned())) {
        return false;
    }

    // Nominal chain.
    if let Some(declared) = reg.parent_of(child) {
        if related(reg, declared, parent, seen) {
            return true;
        }
    }

    // Tag membership.
    if reg.is_tag(parent) && tag_contains(reg, parent, child, seen) {
        return true;
    }

    let child_kind = reg.entry(child).map(|e| &e.kind);
    let parent_kind = reg.entry(parent).map(|e| &e.kind);

    match (child_kind, parent_kind) {
        (Some(TypeKind::Record { fields: cf }), Some(TypeKind::Record { fields: pf })) => {
            records_related(reg, cf, pf, seen)
        }
        (Some(TypeKind::Tuple { slots: cs }), Some(TypeKind::Tuple { slots: ps })) => {
            tuples_related(reg, cs, ps, seen)
        }
        (Some(TypeKind::Enum { labels: cl }), Some(TypeKind::Enum { labels: pl })) => {
            let parent_labels: FxHashSet<String> =
                pl.iter().map(|l| l.to_ascii_lowercase()).collect();
            cl.iter()
                .all(|l| parent_labels.contains(&l.to_ascii_lowercase()))
        }
        (Some(TypeKind::Union { members: cm }), Some(TypeKind::Union { members: pm })) => {
            // Every child member must fit at least one parent member.
            cm.iter()
                .all(|c| pm.iter().any(|p| related(reg, c, p, seen)))
        }
        (Some(TypeKind::Union { members: cm }), _) => {
            // A union extends a non-union only if every member does.
            cm.iter().all(|c| related(reg, c, parent, seen))
        }
        (_, Some(TypeKind::Union { members: pm })) => {
            pm.iter().any(|p| related(reg, child, p, seen))
        }
        _ => false,
    }
}

fn tag_contains(reg: &TypeRegistry, tag: &str, ty: &str, seen: &mut Seen) -> bool {
    let Some(members) = reg.tag_members(tag) else {
        return false;
    };
    for member in members {
        if member == ty {
            return true;
        }
        if reg.is_tag(member) && tag_contains(reg, member, ty, seen) {
            return true;
        }
    }
    // A restriction of a member is still a member.
    members
        .iter()
        .filter(|member| !reg.is_tag(member))
        .any(|member| related(reg, ty, member, seen))
}

fn records_related(
    reg: &TypeRegistry,
    child: &std::collections::BTreeMap<String, FieldInfo>,
    parent: &std::collections::BTreeMap<String, FieldInfo>,
    seen: &mut Seen,
) -> bool {
    parent.iter().all(|(name, parent_field)| {
        child
            .get(name)
            .is_some_and(|child_field| field_related(reg, child_field, parent_field, seen))
    })
}

fn field_related(
    reg: &TypeRegistry,
    child: &FieldInfo,
    parent: &FieldInfo,
    seen: &mut Seen,
) -> bool {
    match (child.self_ref.is_some(), parent.self_ref.is_some()) {
        (false, false) => related(reg, &child.spec, &parent.spec, seen),
        // Self-refs resolve to their ancestor; an unconstrained parent
        // accepts any self-ref.
        (true, true) => match (&child.ancestor, &parent.ancestor) {
            (_, None) => true,
            (Some(ca), Some(pa)) => related(reg, ca, pa, seen),
            (None, Some(_)) => false,
        },
        _ => false,
    }
}

fn tuples_related(
    reg: &TypeRegistry,
    child: &[TupleSlot],
    parent: &[TupleSlot],
    seen: &mut Seen,
) -> bool {
    if child.len() < parent.len() {
        return false;
    }
    parent.iter().zip(child.iter()).all(|(ps, cs)| {
        match (cs.self_ref.is_some(), ps.self_ref.is_some()) {
            (false, false) => related(reg, &cs.spec, &ps.spec, seen),
            (true, true) => match (&cs.ancestor, &ps.ancestor) {
                (_, None) => true,
                (Some(ca), Some(pa)) => related(reg, ca, pa, seen),
                (None, Some(_)) => false,
            },
            _ => false,
        }
    })
}
