//! The schema context: registry plus collaborators, behind one object.
//!
//! All build-up operations take `&mut self`; everything that runs
//! during data validation takes `&self`, so a host may share the schema
//! across worker threads once the build-up phase is over.

use std::sync::Arc;

use tessera_diagnostic::{DiagnosticSink, ErrorKind};
use tessera_parse::TypeAst;

use crate::build;
use crate::builtins;
use crate::contract::{ParseOutcome, ParserRef, ValueContext};
use crate::decl::{self, TypeDecl};
use crate::default;
use crate::entry::{TypeFlags, TypeKind};
use crate::export::{self, SchemaRow};
use crate::expr::ExprCompiler;
use crate::parsers::{TransformFn, ValidatorFn};
use crate::registry::{Comparator, TypeRegistry};
use crate::restrict;
use crate::subtype;
use crate::value::Value;

/// A fully initialised schema: built-in types installed, ready for user
/// registrations and value parsing.
pub struct Schema {
    registry: TypeRegistry,
    expr: Option<Arc<dyn ExprCompiler>>,
}

impl Schema {
    /// Create a schema with the built-in types and no expression
    /// engine. Expression validators will fail to register until one is
    /// attached.
    pub fn new() -> Self {
        let mut registry = TypeRegistry::new();
        builtins::install(&mut registry);
        registry.finish_setup();
        Schema {
            registry,
            expr: None,
        }
    }

    /// Attach the expression sandbox used by `restrict_with_expression`.
    pub fn set_expression_compiler(&mut self, compiler: Arc<dyn ExprCompiler>) {
        self.expr = Some(compiler);
    }

    /// Read access to the registry, for value parsers and introspection.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // === Type construction ===

    /// Parse a type-spec string and install its parser.
    pub fn parse_type(
        &mut self,
        sink: &mut DiagnosticSink,
        spec: &str,
    ) -> Option<(ParserRef, String)> {
        build::parse_type(&mut self.registry, sink, spec)
    }

    /// Build a parser from an already parsed AST.
    pub fn build_type(
        &mut self,
        sink: &mut DiagnosticSink,
        ast: &TypeAst,
    ) -> Option<(ParserRef, String)> {
        build::build_type(&mut self.registry, sink, ast)
    }

    /// Validate one value against a registered type.
    pub fn parse_value(
        &self,
        sink: &mut DiagnosticSink,
        spec: &str,
        raw: &Value,
        ctx: ValueContext,
    ) -> ParseOutcome {
        match self.registry.parser(spec) {
            Some(parser) => sink.with_col_type(spec, |sink| {
                parser.parse(&self.registry, sink, raw, ctx)
            }),
            None => {
                sink.error(ErrorKind::UnknownType, format!("unknown/bad type `{spec}`"));
                ParseOutcome::fail(raw.serialized())
            }
        }
    }

    // === Registration and restriction ===

    pub fn register_alias(&mut self, sink: &mut DiagnosticSink, name: &str, spec: &str) -> bool {
        restrict::register_alias(&mut self.registry, sink, name, spec)
    }

    pub fn register_enum_parser(
        &mut self,
        sink: &mut DiagnosticSink,
        labels: &[String],
        name: Option<&str>,
    ) -> Option<(ParserRef, String)> {
        restrict::register_enum_parser(&mut self.registry, sink, labels, name)
    }

    pub fn register_type_tag(
        &mut self,
        sink: &mut DiagnosticSink,
        tag: &str,
        members: &[String],
    ) -> bool {
        restrict::register_type_tag(&mut self.registry, sink, tag, members)
    }

    pub fn restrict_number(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        min: Option<f64>,
        max: Option<f64>,
        alias: Option<&str>,
    ) -> Option<(ParserRef, String)> {
        restrict::restrict_number(&mut self.registry, sink, parent, min, max, alias)
    }

    pub fn restrict_string(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        min_len: Option<usize>,
        max_len: Option<usize>,
        pattern: Option<&str>,
        alias: Option<&str>,
    ) -> Option<(ParserRef, String)> {
        restrict::restrict_string(&mut self.registry, sink, parent, min_len, max_len, pattern, alias)
    }

    pub fn restrict_enum(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        labels: &[String],
        alias: Option<&str>,
    ) -> Option<(ParserRef, String)> {
        restrict::restrict_enum(&mut self.registry, sink, parent, labels, alias)
    }

    pub fn restrict_union(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        allowed: &[String],
        alias: Option<&str>,
    ) -> Option<(ParserRef, String)> {
        restrict::restrict_union(&mut self.registry, sink, parent, allowed, alias)
    }

    pub fn restrict_with_expression(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        name: &str,
        source: &str,
    ) -> Option<ParserRef> {
        restrict::restrict_with_expression(
            &mut self.registry,
            sink,
            self.expr.as_ref(),
            parent,
            name,
            source,
        )
    }

    pub fn restrict_with_validator(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        name: &str,
        predicate: ValidatorFn,
    ) -> Option<ParserRef> {
        restrict::restrict_with_validator(&mut self.registry, sink, parent, name, predicate)
    }

    pub fn extend_parser(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        name: &str,
        transform: TransformFn,
    ) -> Option<ParserRef> {
        restrict::extend_parser(&mut self.registry, sink, parent, name, transform)
    }

    pub fn restrict_to_type_extending(
        &mut self,
        sink: &mut DiagnosticSink,
        parent: &str,
        name: &str,
        ancestor: &str,
    ) -> Option<ParserRef> {
        restrict::restrict_to_type_extending(&mut self.registry, sink, parent, name, ancestor)
    }

    /// Apply a batch of declarative type definitions.
    pub fn register_types_from_decls(
        &mut self,
        sink: &mut DiagnosticSink,
        decls: &[TypeDecl],
    ) -> bool {
        decl::register_types_from_decls(&mut self.registry, sink, self.expr.as_ref(), decls)
    }

    // === Comparators and defaults ===

    pub fn get_comparator(&self, spec: &str) -> Option<Comparator> {
        self.registry.comparator(spec)
    }

    pub fn create_default_value(&self, spec: &str) -> Option<Value> {
        default::create_default_value(&self.registry, spec)
    }

    // === Subtyping and introspection ===

    /// Strict subtype test: nominal chain, tag membership, structural
    /// record/tuple/enum/union rules.
    pub fn extends_or_restrict(&self, child: &str, parent: &str) -> bool {
        subtype::extends_or_restrict(&self.registry, child, parent)
    }

    pub fn get_type_kind(&self, spec: &str) -> Option<&'static str> {
        self.registry.entry(spec).map(|entry| entry.kind.name())
    }

    pub fn type_parent(&self, spec: &str) -> Option<&str> {
        self.registry.parent_of(spec)
    }

    pub fn is_never_table(&self, spec: &str) -> bool {
        self.registry.has_flag(spec, TypeFlags::NEVER_TABLE)
    }

    pub fn is_built_in_type(&self, spec: &str) -> bool {
        self.registry.has_flag(spec, TypeFlags::BUILT_IN)
    }

    /// Serialisation hint: exporters should emit the canonical string
    /// rather than the parsed value.
    pub fn is_reformatted_as_string(&self, spec: &str) -> bool {
        self.registry.has_flag(spec, TypeFlags::FORCE_STRING)
    }

    pub fn record_field_names(&self, spec: &str) -> Option<Vec<String>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Record { fields }) => Some(fields.keys().cloned().collect()),
            _ => None,
        }
    }

    pub fn record_field_types(&self, spec: &str) -> Option<Vec<(String, String)>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Record { fields }) => Some(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.spec.clone()))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn record_optional_field_names(&self, spec: &str) -> Option<Vec<String>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Record { fields }) => Some(
                fields
                    .iter()
                    .filter(|(_, field)| field.optional)
                    .map(|(name, _)| name.clone())
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn tuple_field_types(&self, spec: &str) -> Option<Vec<String>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Tuple { slots }) => {
                Some(slots.iter().map(|slot| slot.spec.clone()).collect())
            }
            _ => None,
        }
    }

    pub fn array_element_type(&self, spec: &str) -> Option<String> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Array { elem }) => Some(elem.clone()),
            _ => None,
        }
    }

    pub fn map_kv_type(&self, spec: &str) -> Option<(String, String)> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Map { key, value }) => Some((key.clone(), value.clone())),
            _ => None,
        }
    }

    pub fn enum_labels(&self, spec: &str) -> Option<Vec<String>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Enum { labels }) => Some(labels.clone()),
            _ => None,
        }
    }

    pub fn union_types(&self, spec: &str) -> Option<Vec<String>> {
        match self.registry.entry(spec).map(|e| &e.kind) {
            Some(TypeKind::Union { members }) => Some(members.clone()),
            _ => None,
        }
    }

    pub fn list_members_of_tag(&self, tag: &str) -> Option<Vec<String>> {
        subtype::list_members_of_tag(&self.registry, tag)
    }

    pub fn is_member_of_tag(&self, ty: &str, tag: &str) -> bool {
        subtype::is_member_of_tag(&self.registry, ty, tag)
    }

    // === Export ===

    pub fn get_schema_model(&self) -> Vec<SchemaRow> {
        export::schema_model(&self.registry)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema::new()
    }
}
