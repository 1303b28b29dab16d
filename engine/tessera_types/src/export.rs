//! Read-only schema model for downstream consumers.

use serde::{Deserialize, Serialize};

use crate::entry::TypeFlags;
use crate::registry::TypeRegistry;

/// One row of the exported schema model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRow {
    pub name: String,
    /// Canonical spec the name resolves to.
    pub definition: String,
    pub kind: String,
    pub parent: Option<String>,
    pub is_builtin: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub regex: Option<String>,
    pub enum_labels: Option<Vec<String>>,
}

/// Export every registered type and alias, sorted by name.
pub fn schema_model(reg: &TypeRegistry) -> Vec<SchemaRow> {
    let mut rows: Vec<SchemaRow> = Vec::new();

    for spec in reg.specs() {
        rows.push(row_for(reg, spec, spec));
    }
    for name in reg.alias_names() {
        let target = reg.resolve_alias(name).to_owned();
        rows.push(row_for(reg, name, &target));
    }

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

fn row_for(reg: &TypeRegistry, name: &str, definition: &str) -> SchemaRow {
    let kind = reg
        .entry(definition)
        .map_or("name", |entry| entry.kind.name())
        .to_owned();
    let limits = reg.number_limits(definition);
    let (str_min, str_max) = match reg.str_limits(definition) {
        Some(limits) => (limits.min_len, limits.max_len),
        None => (None, None),
    };
    #[allow(clippy::cast_precision_loss)]
    let (min, max) = match limits {
        Some(limits) => (Some(limits.min), Some(limits.max)),
        None => (
            str_min.map(|v| v as f64),
            str_max.map(|v| v as f64),
        ),
    };
    SchemaRow {
        name: name.to_owned(),
        definition: definition.to_owned(),
        kind,
        parent: reg.parent_of(definition).map(str::to_owned),
        is_builtin: reg.has_flag(definition, TypeFlags::BUILT_IN),
        min,
        max,
        regex: reg
            .str_limits(definition)
            .and_then(|limits| limits.pattern.clone()),
        enum_labels: match reg.entry(definition).map(|e| &e.kind) {
            Some(crate::entry::TypeKind::Enum { labels }) => Some(labels.clone()),
            _ => None,
        },
    }
}
