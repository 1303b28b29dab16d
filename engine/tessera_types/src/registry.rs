//! Process-wide type registry.
//!
//! Every table is keyed by canonical spec strings. All writes happen
//! during schema build-up through `&mut self`; value parsing and
//! introspection only ever take `&self`, so the registry is read-only
//! (and safely shared) once the build-up phase ends.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::contract::ParserRef;
use crate::entry::{TypeEntry, TypeFlags};
use crate::value::Value;

/// Total order over values of one type.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Inclusive numeric bounds attached to a numeric type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberLimits {
    pub min: f64,
    pub max: f64,
}

/// Length and pattern bounds attached to a string type.
#[derive(Debug, Clone)]
pub struct StrLimits {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    /// Source pattern, kept for the schema export.
    pub pattern: Option<String>,
    /// Compiled full-match regex.
    pub regex: Option<Regex>,
}

/// The registry tables.
#[derive(Default)]
pub struct TypeRegistry {
    parsers: FxHashMap<String, ParserRef>,
    aliases: FxHashMap<String, String>,
    extends: FxHashMap<String, String>,
    comparators: FxHashMap<String, Comparator>,
    entries: FxHashMap<String, TypeEntry>,
    flags: FxHashMap<String, TypeFlags>,
    /// Negative cache: specs that already failed with `unknown/bad type`.
    unknown_types: FxHashSet<String>,
    number_limits: FxHashMap<String, NumberLimits>,
    str_limits: FxHashMap<String, StrLimits>,
    tag_members: FxHashMap<String, BTreeSet<String>>,
    tag_ancestor: FxHashMap<String, String>,
    union_first_type: FxHashMap<String, String>,
    /// Construction recipes of derived named types, for idempotent
    /// re-registration.
    recipes: FxHashMap<String, String>,
    /// Sources already given the bare-`number` deprecation warning.
    number_warned_sources: FxHashSet<String>,
    setting_up: bool,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry {
            setting_up: true,
            ..TypeRegistry::default()
        }
    }

    /// Whether the engine is still in its initialisation phase.
    pub fn is_setting_up(&self) -> bool {
        self.setting_up
    }

    /// End initialisation: snapshot the built-in set. Called exactly once.
    pub fn finish_setup(&mut self) {
        let keys: Vec<String> = self.parsers.keys().cloned().collect();
        for key in keys {
            self.add_flags(&key, TypeFlags::BUILT_IN);
        }
        self.setting_up = false;
    }

    /// Resolve a user name through the alias table.
    pub fn resolve_alias<'a>(&'a self, spec: &'a str) -> &'a str {
        self.aliases.get(spec).map_or(spec, String::as_str)
    }

    /// Look up the parser for a spec, resolving aliases.
    pub fn parser(&self, spec: &str) -> Option<ParserRef> {
        self.parsers.get(self.resolve_alias(spec)).cloned()
    }

    /// Whether a parser is installed under exactly this canonical spec.
    pub fn has_parser(&self, spec: &str) -> bool {
        self.parsers.contains_key(spec)
    }

    pub fn install_parser(&mut self, spec: impl Into<String>, parser: ParserRef) {
        self.parsers.insert(spec.into(), parser);
    }

    pub fn alias_target(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn set_alias(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(name.into(), target.into());
    }

    /// Direct parent in the extends chain.
    pub fn parent_of(&self, spec: &str) -> Option<&str> {
        self.extends.get(self.resolve_alias(spec)).map(String::as_str)
    }

    pub fn set_parent(&mut self, child: impl Into<String>, parent: impl Into<String>) {
        let child = child.into();
        let parent = parent.into();
        debug_assert_ne!(child, parent, "a type cannot extend itself");
        self.extends.insert(child, parent);
    }

    pub fn entry(&self, spec: &str) -> Option<&TypeEntry> {
        self.entries.get(self.resolve_alias(spec))
    }

    pub fn set_entry(&mut self, entry: TypeEntry) {
        self.entries.insert(entry.spec.clone(), entry);
    }

    pub fn flags(&self, spec: &str) -> TypeFlags {
        self.flags
            .get(self.resolve_alias(spec))
            .copied()
            .unwrap_or_default()
    }

    pub fn has_flag(&self, spec: &str, flag: TypeFlags) -> bool {
        self.flags(spec).contains(flag)
    }

    pub fn add_flags(&mut self, spec: &str, flags: TypeFlags) {
        *self.flags.entry(spec.to_owned()).or_default() |= flags;
    }

    pub fn comparator(&self, spec: &str) -> Option<Comparator> {
        self.comparators.get(self.resolve_alias(spec)).cloned()
    }

    pub fn set_comparator(&mut self, spec: impl Into<String>, comparator: Comparator) {
        self.comparators.insert(spec.into(), comparator);
    }

    pub fn is_unknown(&self, spec: &str) -> bool {
        self.unknown_types.contains(spec)
    }

    /// Record a failed spec so its error is reported only once.
    pub fn mark_unknown(&mut self, spec: impl Into<String>) {
        self.unknown_types.insert(spec.into());
    }

    pub fn number_limits(&self, spec: &str) -> Option<NumberLimits> {
        self.number_limits.get(self.resolve_alias(spec)).copied()
    }

    pub fn set_number_limits(&mut self, spec: impl Into<String>, limits: NumberLimits) {
        self.number_limits.insert(spec.into(), limits);
    }

    /// Tightest numeric bounds along the extends chain, starting at
    /// `spec` itself.
    pub fn effective_number_limits(&self, spec: &str) -> Option<NumberLimits> {
        let mut current = Some(self.resolve_alias(spec).to_owned());
        let mut acc: Option<NumberLimits> = None;
        let mut hops = 0;
        while let Some(ty) = current {
            if let Some(limits) = self.number_limits.get(&ty) {
                acc = Some(match acc {
                    None => *limits,
                    Some(prev) => NumberLimits {
                        min: prev.min.max(limits.min),
                        max: prev.max.min(limits.max),
                    },
                });
            }
            current = self.extends.get(&ty).cloned();
            hops += 1;
            if hops > 64 {
                break;
            }
        }
        acc
    }

    pub fn str_limits(&self, spec: &str) -> Option<&StrLimits> {
        self.str_limits.get(self.resolve_alias(spec))
    }

    pub fn set_str_limits(&mut self, spec: impl Into<String>, limits: StrLimits) {
        self.str_limits.insert(spec.into(), limits);
    }

    /// Tightest length bounds along the extends chain.
    pub fn effective_str_lengths(&self, spec: &str) -> (Option<usize>, Option<usize>) {
        let mut current = Some(self.resolve_alias(spec).to_owned());
        let mut min_len: Option<usize> = None;
        let mut max_len: Option<usize> = None;
        let mut hops = 0;
        while let Some(ty) = current {
            if let Some(limits) = self.str_limits.get(&ty) {
                if let Some(lo) = limits.min_len {
                    min_len = Some(min_len.map_or(lo, |m: usize| m.max(lo)));
                }
                if let Some(hi) = limits.max_len {
                    max_len = Some(max_len.map_or(hi, |m: usize| m.min(hi)));
                }
            }
            current = self.extends.get(&ty).cloned();
            hops += 1;
            if hops > 64 {
                break;
            }
        }
        (min_len, max_len)
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tag_members.contains_key(name)
    }

    pub fn tag_members(&self, tag: &str) -> Option<&BTreeSet<String>> {
        self.tag_members.get(tag)
    }

    pub fn tag_ancestor(&self, tag: &str) -> Option<&str> {
        self.tag_ancestor.get(tag).map(String::as_str)
    }

    pub fn set_tag(
        &mut self,
        tag: impl Into<String>,
        members: BTreeSet<String>,
        ancestor: Option<String>,
    ) {
        let tag = tag.into();
        if let Some(ancestor) = ancestor {
            self.tag_ancestor.insert(tag.clone(), ancestor);
        }
        self.tag_members.insert(tag, members);
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_members.keys().map(String::as_str)
    }

    pub fn union_first_type(&self, spec: &str) -> Option<&str> {
        self.union_first_type
            .get(self.resolve_alias(spec))
            .map(String::as_str)
    }

    pub fn set_union_first_type(&mut self, spec: impl Into<String>, first: impl Into<String>) {
        self.union_first_type.insert(spec.into(), first.into());
    }

    pub fn recipe(&self, name: &str) -> Option<&str> {
        self.recipes.get(name).map(String::as_str)
    }

    pub fn set_recipe(&mut self, name: impl Into<String>, recipe: impl Into<String>) {
        self.recipes.insert(name.into(), recipe.into());
    }

    /// Whether the bare-`number` deprecation warning should fire for
    /// this source. Fires at most once per source.
    pub fn should_warn_bare_number(&mut self, source: &str) -> bool {
        self.number_warned_sources.insert(source.to_owned())
    }

    /// All registered canonical specs, sorted.
    pub fn specs(&self) -> Vec<&str> {
        let mut specs: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        specs.sort_unstable();
        specs
    }

    /// All alias names, sorted.
    pub fn alias_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
