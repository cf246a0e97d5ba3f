//! Opt-in argument normalizations.
//!
//! These rewrite what decorators receive, so they are off by default and only
//! run when the configuration asks for them. Each produces text edits local
//! to one decoration list entry; the planner turns them into
//! `RewriteArgument` operations.

use oxc_ast::ast::{
    ArrowFunctionExpression, Expression, ObjectPropertyKind, PropertyKey, PropertyKind, Statement,
};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::{BinaryOperator, LogicalOperator, UnaryOperator};

use crate::model::{TextEdit, TypeExpr};
use crate::syntax::{self, unparen};

/// Body of `() => <expr>` when it is safe to use in place of the arrow:
/// no parameters, not async, and the body is an identifier, a static member
/// access or an array literal.
fn simple_arrow_body(arrow: &ArrowFunctionExpression<'_>) -> Option<Span> {
    if !arrow.expression
        || arrow.r#async
        || !arrow.params.items.is_empty()
        || arrow.params.rest.is_some()
    {
        return None;
    }
    let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() else {
        return None;
    };
    match &stmt.expression {
        Expression::Identifier(_)
        | Expression::StaticMemberExpression(_)
        | Expression::ArrayExpression(_) => Some(stmt.expression.span()),
        _ => None,
    }
}

fn unwrap_arrow(expr: &Expression<'_>, source: &str, out: &mut Vec<TextEdit>) {
    if let Expression::ArrowFunctionExpression(arrow) = expr {
        if let Some(body) = simple_arrow_body(arrow) {
            out.push(TextEdit::new(arrow.span, syntax::text(source, body)));
        }
    }
}

/// `Dec(() => String)` -> `Dec(String)`, descending into nested calls such as
/// `param(0, Args(() => String))`.
pub fn decorator_arrows(expr: &Expression<'_>, source: &str, out: &mut Vec<TextEdit>) {
    if let Expression::CallExpression(call) = unparen(expr) {
        for arg in &call.arguments {
            let Some(arg) = syntax::argument_expression(arg) else {
                continue;
            };
            decorator_arrows(arg, source, out);
            unwrap_arrow(arg, source, out);
        }
    }
}

fn is_type_key(key: &PropertyKey<'_>) -> bool {
    match key {
        PropertyKey::StaticIdentifier(ident) => ident.name == "type",
        PropertyKey::StringLiteral(lit) => lit.value == "type",
        _ => false,
    }
}

/// `Args('id', { type: () => String })` -> `Args('id', { type: String })`.
pub fn type_arrow_props(expr: &Expression<'_>, source: &str, out: &mut Vec<TextEdit>) {
    match unparen(expr) {
        Expression::CallExpression(call) => {
            for arg in &call.arguments {
                if let Some(arg) = syntax::argument_expression(arg) {
                    type_arrow_props(arg, source, out);
                }
            }
        }
        Expression::ObjectExpression(obj) => {
            for prop in &obj.properties {
                if let ObjectPropertyKind::ObjectProperty(prop) = prop {
                    if prop.kind == PropertyKind::Init
                        && !prop.method
                        && !prop.computed
                        && is_type_key(&prop.key)
                    {
                        unwrap_arrow(&prop.value, source, out);
                    }
                }
            }
        }
        _ => {}
    }
}

/// `typeof X === "undefined"`, possibly chained with `||`.
fn is_undefined_guard(test: &Expression<'_>) -> bool {
    match unparen(test) {
        Expression::LogicalExpression(logical) if logical.operator == LogicalOperator::Or => {
            is_undefined_guard(&logical.left) && is_undefined_guard(&logical.right)
        }
        Expression::BinaryExpression(binary) => is_typeof_comparison(
            &binary.left,
            binary.operator,
            &binary.right,
            "undefined",
        ),
        _ => false,
    }
}

fn is_typeof_comparison(
    left: &Expression<'_>,
    operator: BinaryOperator,
    right: &Expression<'_>,
    expected: &str,
) -> bool {
    matches!(operator, BinaryOperator::StrictEquality | BinaryOperator::Equality)
        && matches!(unparen(left), Expression::UnaryExpression(u) if u.operator == UnaryOperator::Typeof)
        && syntax::string_value(right) == Some(expected)
}

fn is_object(expr: &Expression<'_>) -> bool {
    matches!(unparen(expr), Expression::Identifier(ident) if ident.name == "Object")
}

/// The two guard shapes emitters produce for types that may not exist at runtime:
///
/// - `typeof X === "undefined" ? Object : X`
/// - `typeof (_a = typeof X !== "undefined" && X) === "function" ? _a : Object`
fn is_typeof_guard(expr: &Expression<'_>) -> bool {
    let Expression::ConditionalExpression(cond) = unparen(expr) else {
        return false;
    };
    if is_object(&cond.consequent) && is_undefined_guard(&cond.test) {
        return true;
    }
    if is_object(&cond.alternate) {
        if let Expression::BinaryExpression(binary) = unparen(&cond.test) {
            return is_typeof_comparison(&binary.left, binary.operator, &binary.right, "function");
        }
    }
    false
}

/// Replace typeof guard conditionals in a metadata value (or its array
/// elements) with `Object`.
pub fn typeof_guards(value: &Expression<'_>, out: &mut Vec<TextEdit>) {
    match unparen(value) {
        expr if is_typeof_guard(expr) => out.push(TextEdit::new(value.span(), "Object")),
        Expression::ArrayExpression(array) => {
            for element in &array.elements {
                if let Some(item) = syntax::element_expression(element) {
                    typeof_guards(item, out);
                }
            }
        }
        _ => {}
    }
}

/// The metadata value as it reads once [`typeof_guards`] has been applied.
pub fn guarded_type_expr(value: &Expression<'_>) -> TypeExpr {
    if is_typeof_guard(value) {
        return TypeExpr::Reference("Object".to_string());
    }
    match unparen(value) {
        Expression::ArrayExpression(array) => {
            let mut items = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                match syntax::element_expression(element) {
                    Some(item) => items.push(guarded_type_expr(item)),
                    None => return TypeExpr::Other,
                }
            }
            TypeExpr::Tuple(items)
        }
        _ => syntax::type_expr(value),
    }
}
