//! Data-driven type registration.
//!
//! A batch of declarative [`TypeDecl`] records, typically deserialised
//! from a package manifest, dispatches onto the restriction API. Errors
//! on one declaration never abort the batch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_diagnostic::{DiagnosticSink, ErrorKind};

use crate::expr::ExprCompiler;
use crate::registry::TypeRegistry;
use crate::restrict;

/// One declarative type definition.
///
/// At most one constraint family may be present: numeric (`min`/`max`),
/// string (`min_len`/`max_len`/`pattern`), enum (`values`), expression
/// (`validate`), or ancestor (`ancestor`). With no constraints the
/// declaration is a plain alias of `parent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeDecl {
    pub name: String,
    pub parent: Option<String>,
    pub ancestor: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub pattern: Option<String>,
    pub validate: Option<String>,
    pub values: Option<Vec<String>>,
}

impl TypeDecl {
    fn families(&self) -> usize {
        let numeric = self.min.is_some() || self.max.is_some();
        let string = self.min_len.is_some() || self.max_len.is_some() || self.pattern.is_some();
        let enumeration = self.values.is_some();
        let expression = self.validate.is_some();
        let ancestor = self.ancestor.is_some();
        [numeric, string, enumeration, expression, ancestor]
            .into_iter()
            .filter(|present| *present)
            .count()
    }
}

/// Apply a batch of declarations. Each failing declaration is logged
/// and skipped; the result is `true` only when every one succeeded.
pub fn register_types_from_decls(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    compiler: Option<&Arc<dyn ExprCompiler>>,
    decls: &[TypeDecl],
) -> bool {
    let mut all_ok = true;
    for decl in decls {
        if !register_decl(reg, sink, compiler, decl) {
            all_ok = false;
        }
    }
    all_ok
}

fn register_decl(
    reg: &mut TypeRegistry,
    sink: &mut DiagnosticSink,
    compiler: Option<&Arc<dyn ExprCompiler>>,
    decl: &TypeDecl,
) -> bool {
    if decl.name.is_empty() {
        sink.error(ErrorKind::Parse, "a type declaration needs a name");
        return false;
    }
    if decl.families() > 1 {
        sink.error(
            ErrorKind::Parse,
            format!("`{}` mixes more than one constraint family", decl.name),
        );
        return false;
    }

    if decl.min.is_some() || decl.max.is_some() {
        let parent = decl.parent.as_deref().unwrap_or("number");
        return restrict::restrict_number(reg, sink, parent, decl.min, decl.max, Some(&decl.name))
            .is_some();
    }
    if decl.min_len.is_some() || decl.max_len.is_some() || decl.pattern.is_some() {
        let parent = decl.parent.as_deref().unwrap_or("string");
        return restrict::restrict_string(
            reg,
            sink,
            parent,
            decl.min_len,
            decl.max_len,
            decl.pattern.as_deref(),
            Some(&decl.name),
        )
        .is_some();
    }
    if let Some(values) = &decl.values {
        return match decl.parent.as_deref() {
            Some(parent) => {
                restrict::restrict_enum(reg, sink, parent, values, Some(&decl.name)).is_some()
            }
            None => {
                restrict::register_enum_parser(reg, sink, values, Some(&decl.name)).is_some()
            }
        };
    }
    if let Some(source) = &decl.validate {
        let Some(parent) = decl.parent.as_deref() else {
            sink.error(
                ErrorKind::Parse,
                format!("`{}` needs a parent for its validator", decl.name),
            );
            return false;
        };
        return restrict::restrict_with_expression(
            reg, sink, compiler, parent, &decl.name, source,
        )
        .is_some();
    }
    if let Some(ancestor) = &decl.ancestor {
        let parent = decl.parent.as_deref().unwrap_or("string");
        return restrict::restrict_to_type_extending(reg, sink, parent, &decl.name, ancestor)
            .is_some();
    }

    // No constraints: a plain alias.
    let Some(parent) = decl.parent.as_deref() else {
        sink.error(
            ErrorKind::Parse,
            format!("`{}` declares neither a parent nor a constraint", decl.name),
        );
        return false;
    };
    restrict::register_alias(reg, sink, &decl.name, parent)
}
