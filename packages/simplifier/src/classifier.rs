//! Call-Shape Classifier
//!
//! Finds every call of the decorate helper and turns it into a
//! [`DecoratedMember`], or into an opaque site when any part of it does not
//! have a shape we are sure about. Classification never guesses: a single
//! unexpected element makes the whole site opaque, and opaque sites are
//! emitted byte-for-byte.

use std::collections::HashMap;

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::{CallExpression, Expression, Program, Statement};
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;
use smallvec::SmallVec;

use crate::bindings::{Helper, ModuleBinding, UnitIndex};
use crate::config::Options;
use crate::model::{
    DecoratedMember, Decoration, DecoratorIdentity, Descriptor, Entry, EntryId, MemberKind,
    MetadataEntry, MetadataKind, MetadataKinds, Site, TextEdit, UnrecognizedShape,
};
use crate::normalize;
use crate::syntax::{self, callee_target, member_path, unparen};

/// Classify every decoration site in the unit, in source order.
pub fn classify(
    program: &Program<'_>,
    source: &str,
    index: &UnitIndex,
    options: &Options,
) -> Vec<Site> {
    let mut collector = SiteCollector {
        source,
        index,
        options,
        standalone: HashMap::new(),
        sites: Vec::new(),
    };
    collector.visit_program(program);
    collector.sites
}

struct SiteCollector<'s> {
    source: &'s str,
    index: &'s UnitIndex,
    options: &'s Options,
    /// Call span -> statement span, for calls that are a whole statement of
    /// a statement list and can be deleted without joining their neighbours.
    standalone: HashMap<(u32, u32), Span>,
    sites: Vec<Site>,
}

impl<'a> Visit<'a> for SiteCollector<'_> {
    fn visit_statements(&mut self, it: &ArenaVec<'a, Statement<'a>>) {
        for stmt in it {
            if let Statement::ExpressionStatement(stmt) = stmt {
                if let Expression::CallExpression(call) = &stmt.expression {
                    if syntax::detaches_cleanly(self.source, stmt.span) {
                        self.standalone
                            .insert((call.span.start, call.span.end), stmt.span);
                    }
                }
            }
        }
        walk::walk_statements(self, it);
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if self.index.helper_of(&it.callee) == Some(Helper::Decorate) {
            let statement = self
                .standalone
                .get(&(it.span.start, it.span.end))
                .copied();
            let site = classify_call(it, statement, self.source, self.index, self.options);
            match &site {
                Site::Member(member) => tracing::debug!(
                    site = %member.label(),
                    entries = member.entries.len(),
                    "classified decoration site"
                ),
                Site::Opaque { span, reason } => tracing::debug!(
                    start = span.start,
                    ?reason,
                    "leaving unrecognized decoration site untouched"
                ),
            }
            self.sites.push(site);
        }
        walk::walk_call_expression(self, it);
    }
}

/// Classify one call already known to target the decorate helper.
pub fn classify_call(
    call: &CallExpression<'_>,
    statement: Option<Span>,
    source: &str,
    index: &UnitIndex,
    options: &Options,
) -> Site {
    match classify_member(call, statement, source, index, options) {
        Ok(member) => Site::Member(member),
        Err(reason) => Site::Opaque {
            span: call.span,
            reason,
        },
    }
}

fn classify_member(
    call: &CallExpression<'_>,
    statement: Option<Span>,
    source: &str,
    index: &UnitIndex,
    options: &Options,
) -> Result<DecoratedMember, UnrecognizedShape> {
    let args = call
        .arguments
        .iter()
        .map(syntax::argument_expression)
        .collect::<Option<SmallVec<[&Expression<'_>; 4]>>>()
        .ok_or(UnrecognizedShape::WrongArity)?;

    let (list_expr, target, key_expr, descriptor_expr) = match args.as_slice() {
        [list, target, key, descriptor] => (*list, *target, Some(*key), Some(*descriptor)),
        [list, target] => (*list, *target, None, None),
        _ => return Err(UnrecognizedShape::WrongArity),
    };

    let Expression::ArrayExpression(list) = unparen(list_expr) else {
        return Err(UnrecognizedShape::NotAnArray);
    };

    let key = match key_expr {
        Some(key) => Some(
            syntax::string_value(key)
                .ok_or(UnrecognizedShape::KeyNotLiteral)?
                .to_string(),
        ),
        None => None,
    };

    let descriptor = match descriptor_expr {
        None => Descriptor::Absent,
        Some(d) if syntax::is_null(d) => Descriptor::Null,
        Some(d) if syntax::is_undefined(d) => Descriptor::Undefined,
        Some(_) => Descriptor::Expression,
    };

    let path = member_path(target);
    let (class_name, is_static) = match (path.as_deref(), &key) {
        (Some([class, "prototype"]), Some(_)) => (Some(class.to_string()), false),
        (Some([class]), _) => (Some(class.to_string()), key.is_some()),
        _ => (None, false),
    };

    let table = class_name.as_deref().and_then(|name| index.class(name));
    let shape = match &key {
        Some(key) => table.and_then(|t| t.member(key, is_static)),
        None => table.and_then(|t| t.constructor.clone()),
    };

    // Without a declaration the descriptor argument is the best hint we have.
    let kind = match (&key, &shape, descriptor) {
        (None, _, _) => MemberKind::Class,
        (_, Some(shape), _) => shape.kind,
        (_, None, Descriptor::Undefined) => MemberKind::Property,
        (_, None, _) => MemberKind::Method,
    };

    let mut entries: SmallVec<[Entry; 6]> = SmallVec::new();
    let mut seen = MetadataKinds::empty();
    for (position, element) in list.elements.iter().enumerate() {
        let expr = syntax::element_expression(element).ok_or(UnrecognizedShape::SpreadOrHole)?;
        let entry = classify_entry(EntryId(position as u32), expr, source, index, options)?;
        if let Entry::Metadata(meta) = &entry {
            if seen.contains_kind(meta.kind) {
                return Err(UnrecognizedShape::DuplicateMetadata);
            }
            seen |= meta.kind.flag();
        }
        entries.push(entry);
    }

    Ok(DecoratedMember {
        site: call.span,
        list: list.span,
        statement,
        class_name,
        is_static,
        key,
        kind,
        descriptor,
        pure_target: syntax::is_pure_reference(target),
        shape,
        entries,
    })
}

fn classify_entry(
    id: EntryId,
    expr: &Expression<'_>,
    source: &str,
    index: &UnitIndex,
    options: &Options,
) -> Result<Entry, UnrecognizedShape> {
    let span = syntax::span_of(expr);

    if let Expression::CallExpression(call) = unparen(expr) {
        match index.helper_of(&call.callee) {
            Some(Helper::Param) => {
                let [param_index, decorator] = &call.arguments[..] else {
                    return Err(UnrecognizedShape::ParamArity);
                };
                let (Some(param_index), Some(decorator)) = (
                    syntax::argument_expression(param_index),
                    syntax::argument_expression(decorator),
                ) else {
                    return Err(UnrecognizedShape::ParamArity);
                };
                let param_index =
                    syntax::index_value(param_index).ok_or(UnrecognizedShape::ParamIndexNotLiteral)?;
                return Ok(Entry::Decoration(Decoration {
                    id,
                    span,
                    param_index: Some(param_index),
                    identity: identity_of(decorator, index),
                    rewrites: decorator_rewrites(decorator, source, options),
                }));
            }
            Some(Helper::Metadata) => {
                let [key, value] = &call.arguments[..] else {
                    return Err(UnrecognizedShape::MetadataArity);
                };
                let (Some(key), Some(value)) = (
                    syntax::argument_expression(key),
                    syntax::argument_expression(value),
                ) else {
                    return Err(UnrecognizedShape::MetadataArity);
                };
                let key = syntax::string_value(key).ok_or(UnrecognizedShape::MetadataKeyNotLiteral)?;
                return Ok(match MetadataKind::from_key(key) {
                    Some(kind) => {
                        let rewrites = metadata_rewrites(kind, value, options);
                        // Judge the value as it will be emitted.
                        let value_expr = if rewrites.is_empty() {
                            syntax::type_expr(value)
                        } else {
                            normalize::guarded_type_expr(value)
                        };
                        Entry::Metadata(MetadataEntry {
                            id,
                            span,
                            kind,
                            value: value_expr,
                            value_span: syntax::span_of(value),
                            rewrites,
                        })
                    }
                    None => Entry::Decoration(Decoration {
                        id,
                        span,
                        param_index: None,
                        identity: DecoratorIdentity::MetadataHelper,
                        rewrites: Vec::new(),
                    }),
                });
            }
            Some(Helper::Decorate) | None => {}
        }
    }

    Ok(Entry::Decoration(Decoration {
        id,
        span,
        param_index: None,
        identity: identity_of(expr, index),
        rewrites: decorator_rewrites(expr, source, options),
    }))
}

fn decorator_rewrites(expr: &Expression<'_>, source: &str, options: &Options) -> Vec<TextEdit> {
    let mut edits = Vec::new();
    if options.unwrap_decorator_arrows {
        normalize::decorator_arrows(expr, source, &mut edits);
    }
    if options.unwrap_type_arrows {
        normalize::type_arrow_props(expr, source, &mut edits);
    }
    edits
}

fn metadata_rewrites(kind: MetadataKind, value: &Expression<'_>, options: &Options) -> Vec<TextEdit> {
    let enabled = match kind {
        MetadataKind::ParamTypes => options.simplify_metadata_typeofs,
        MetadataKind::Type => options.simplify_design_type_typeofs,
        MetadataKind::ReturnType => false,
    };
    let mut edits = Vec::new();
    if enabled {
        normalize::typeof_guards(value, &mut edits);
    }
    edits
}

/// Resolve who a decorator is from its callee path.
///
/// `Foo`, `Foo(...)`, `ns.Foo(...)` and `(0, ns.Foo)(...)` resolve; the local
/// name or namespace is traced back to its module when it was imported.
pub fn identity_of(expr: &Expression<'_>, index: &UnitIndex) -> DecoratorIdentity {
    let callee = match unparen(expr) {
        Expression::CallExpression(call) => &call.callee,
        other => other,
    };
    let Some(path) = member_path(callee_target(callee)) else {
        return DecoratorIdentity::Unresolved;
    };

    match path.as_slice() {
        [local] => match index.module_binding(local) {
            Some(ModuleBinding::Named { module, imported }) => {
                DecoratorIdentity::named(Some(module.as_str()), imported)
            }
            Some(ModuleBinding::Namespace(module)) => {
                DecoratorIdentity::named(Some(module.as_str()), "default")
            }
            None => DecoratorIdentity::named(None, local),
        },
        [namespace, .., name] => match index.module_binding(namespace) {
            Some(ModuleBinding::Namespace(module)) => {
                DecoratorIdentity::named(Some(module.as_str()), name)
            }
            _ => DecoratorIdentity::named(None, name),
        },
        [] => DecoratorIdentity::Unresolved,
    }
}
