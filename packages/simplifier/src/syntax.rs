//! Helpers for reading OXC expressions by shape.
//!
//! OXC splits expressions across several enums (`Expression`, `Argument`,
//! `ArrayExpressionElement`) that share variants but are not type-compatible.
//! Everything here works on `Expression`; callers convert with
//! `as_expression()` first and treat spreads and holes as unrecognized.

use oxc_ast::ast::{Argument, ArrayExpressionElement, Expression, PropertyKey};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::UnaryOperator;
use smallvec::SmallVec;

use crate::model::{LiteralKind, TypeExpr};

/// Dotted name path such as `["_common", "Injectable"]`.
pub type Path<'a> = SmallVec<[&'a str; 4]>;

/// Strip any number of redundant parentheses.
pub fn unparen<'b, 'a>(mut expr: &'b Expression<'a>) -> &'b Expression<'a> {
    while let Expression::ParenthesizedExpression(paren) = expr {
        expr = &paren.expression;
    }
    expr
}

/// Strip the `(0, ns.fn)` indirection emitters use to call imports without a `this`.
pub fn callee_target<'b, 'a>(callee: &'b Expression<'a>) -> &'b Expression<'a> {
    let callee = unparen(callee);
    if let Expression::SequenceExpression(seq) = callee {
        if seq.expressions.len() == 2 && is_zero(&seq.expressions[0]) {
            return unparen(&seq.expressions[1]);
        }
    }
    callee
}

fn is_zero(expr: &Expression<'_>) -> bool {
    matches!(unparen(expr), Expression::NumericLiteral(lit) if lit.value == 0.0)
}

/// The identifier/static-member chain an expression spells, if any.
pub fn member_path<'b>(expr: &'b Expression<'_>) -> Option<Path<'b>> {
    match unparen(expr) {
        Expression::Identifier(ident) => {
            let mut path = Path::new();
            path.push(ident.name.as_str());
            Some(path)
        }
        Expression::StaticMemberExpression(member) => {
            let mut path = member_path(&member.object)?;
            path.push(member.property.name.as_str());
            Some(path)
        }
        _ => None,
    }
}

pub fn argument_expression<'b, 'a>(arg: &'b Argument<'a>) -> Option<&'b Expression<'a>> {
    arg.as_expression()
}

pub fn element_expression<'b, 'a>(
    element: &'b ArrayExpressionElement<'a>,
) -> Option<&'b Expression<'a>> {
    element.as_expression()
}

pub fn string_value<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    match unparen(expr) {
        Expression::StringLiteral(lit) => Some(lit.value.as_str()),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() && tpl.quasis.len() == 1 => {
            tpl.quasis[0].value.cooked.as_ref().map(|atom| atom.as_str())
        }
        _ => None,
    }
}

/// A non-negative integer literal that fits a parameter index.
pub fn index_value(expr: &Expression<'_>) -> Option<u32> {
    match unparen(expr) {
        Expression::NumericLiteral(lit)
            if lit.value >= 0.0 && lit.value.fract() == 0.0 && lit.value <= f64::from(u32::MAX) =>
        {
            Some(lit.value as u32)
        }
        _ => None,
    }
}

pub fn is_null(expr: &Expression<'_>) -> bool {
    matches!(unparen(expr), Expression::NullLiteral(_))
}

/// `void 0` (any `void <literal>`) or the global `undefined`.
pub fn is_undefined(expr: &Expression<'_>) -> bool {
    match unparen(expr) {
        Expression::UnaryExpression(unary) => {
            unary.operator == UnaryOperator::Void && is_literal(&unary.argument)
        }
        Expression::Identifier(ident) => ident.name == "undefined",
        _ => false,
    }
}

fn is_literal(expr: &Expression<'_>) -> bool {
    matches!(
        unparen(expr),
        Expression::NumericLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BooleanLiteral(_)
            | Expression::NullLiteral(_)
    )
}

/// Expressions whose evaluation cannot run user code: identifiers, literals,
/// and `X.prototype`.
pub fn is_pure_reference(expr: &Expression<'_>) -> bool {
    match unparen(expr) {
        Expression::Identifier(_) | Expression::StringLiteral(_) | Expression::NumericLiteral(_) => {
            true
        }
        Expression::StaticMemberExpression(member) => {
            member.property.name == "prototype"
                && matches!(unparen(&member.object), Expression::Identifier(_))
        }
        _ => false,
    }
}

/// Structural reading of an emitted metadata value.
pub fn type_expr(expr: &Expression<'_>) -> TypeExpr {
    if is_undefined(expr) {
        return TypeExpr::Void;
    }
    match unparen(expr) {
        Expression::Identifier(ident) => TypeExpr::Reference(ident.name.to_string()),
        Expression::StaticMemberExpression(_) => match member_path(expr) {
            Some(path) => TypeExpr::Qualified(path.join(".")),
            None => TypeExpr::Other,
        },
        Expression::ArrayExpression(array) => {
            let mut items = Vec::with_capacity(array.elements.len());
            for element in &array.elements {
                match element_expression(element) {
                    Some(item) => items.push(type_expr(item)),
                    None => return TypeExpr::Other,
                }
            }
            TypeExpr::Tuple(items)
        }
        _ => TypeExpr::Other,
    }
}

/// Primitive kind of a literal initializer (`5`, `-1`, `"a"`, `` `a` ``, `true`, `1n`).
pub fn literal_kind(expr: &Expression<'_>) -> Option<LiteralKind> {
    match unparen(expr) {
        Expression::NumericLiteral(_) => Some(LiteralKind::Number),
        Expression::StringLiteral(_) => Some(LiteralKind::String),
        Expression::TemplateLiteral(tpl) if tpl.expressions.is_empty() => Some(LiteralKind::String),
        Expression::BooleanLiteral(_) => Some(LiteralKind::Boolean),
        Expression::BigIntLiteral(_) => Some(LiteralKind::BigInt),
        Expression::UnaryExpression(unary) if unary.operator == UnaryOperator::UnaryNegation => {
            match unparen(&unary.argument) {
                Expression::NumericLiteral(_) => Some(LiteralKind::Number),
                Expression::BigIntLiteral(_) => Some(LiteralKind::BigInt),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Static name of a class member key; `None` for private and computed keys.
pub fn property_key_name(key: &PropertyKey<'_>, computed: bool) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) if !computed => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        PropertyKey::NumericLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

/// Whether the statement at `span` can be deleted without its neighbours
/// running together: the code before it is already terminated, or the code
/// after it cannot continue an expression across the gap.
pub fn detaches_cleanly(source: &str, span: Span) -> bool {
    let before = source[..span.start as usize].trim_end();
    if before.is_empty() || before.ends_with(';') || before.ends_with('{') {
        return true;
    }
    match source[span.end as usize..].trim_start().chars().next() {
        None => true,
        // `(`, `[`, `` ` ``, operators and comments may all bind to the
        // previous line once the statement between them is gone.
        Some(c) => c == '}' || c == ';' || c == '_' || c == '$' || c == '"' || c == '\'' || c.is_alphanumeric(),
    }
}

pub fn text<'s>(source: &'s str, span: Span) -> &'s str {
    &source[span.start as usize..span.end as usize]
}

pub fn span_of(expr: &Expression<'_>) -> Span {
    expr.span()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_expr<R>(source: &str, f: impl FnOnce(&Expression<'_>) -> R) -> R {
        let allocator = Allocator::default();
        let expr = Parser::new(&allocator, source, SourceType::mjs())
            .parse_expression()
            .unwrap_or_else(|errors| panic!("Parse errors: {:?}", errors));
        f(&expr)
    }

    #[test]
    fn should_strip_zero_sequence_callee() {
        let path = with_expr("(0, _common.Injectable)", |e| {
            member_path(callee_target(e)).map(|p| p.join("."))
        });
        assert_eq!(path.as_deref(), Some("_common.Injectable"));
    }

    #[test]
    fn should_not_strip_non_zero_sequence() {
        let path = with_expr("(1, _common.Injectable)", |e| {
            member_path(callee_target(e)).map(|p| p.join("."))
        });
        assert_eq!(path, None);
    }

    #[test]
    fn should_read_type_expressions() {
        assert_eq!(
            with_expr("Function", type_expr),
            TypeExpr::Reference("Function".into())
        );
        assert_eq!(with_expr("void 0", type_expr), TypeExpr::Void);
        assert_eq!(
            with_expr("mongoose.Types.ObjectId", type_expr),
            TypeExpr::Qualified("mongoose.Types.ObjectId".into())
        );
        assert_eq!(
            with_expr("[Object, String]", type_expr),
            TypeExpr::Tuple(vec![
                TypeExpr::Reference("Object".into()),
                TypeExpr::Reference("String".into()),
            ])
        );
        assert_eq!(
            with_expr("typeof X === \"undefined\" ? Object : X", type_expr),
            TypeExpr::Other
        );
    }

    #[test]
    fn should_read_parameter_indices() {
        assert_eq!(with_expr("3", index_value), Some(3));
        assert_eq!(with_expr("1.5", index_value), None);
        assert_eq!(with_expr("-1", index_value), None);
        assert_eq!(with_expr("i", index_value), None);
    }

    #[test]
    fn should_classify_literal_initializers() {
        assert_eq!(with_expr("42", literal_kind), Some(LiteralKind::Number));
        assert_eq!(with_expr("-42", literal_kind), Some(LiteralKind::Number));
        assert_eq!(with_expr("'a'", literal_kind), Some(LiteralKind::String));
        assert_eq!(with_expr("`a`", literal_kind), Some(LiteralKind::String));
        assert_eq!(with_expr("false", literal_kind), Some(LiteralKind::Boolean));
        assert_eq!(with_expr("10n", literal_kind), Some(LiteralKind::BigInt));
        assert_eq!(with_expr("`a${b}`", literal_kind), None);
        assert_eq!(with_expr("new Date()", literal_kind), None);
    }

    #[test]
    fn should_detach_statements_between_terminated_code() {
        let source = "let b = a;\nx();\n(function () {})()";
        assert!(detaches_cleanly(source, Span::new(11, 15)));
        let source = "x();\n(function () {})()";
        assert!(detaches_cleanly(source, Span::new(0, 4)));
    }

    #[test]
    fn should_detach_when_next_line_starts_a_statement() {
        let source = "let b = a\nx();\nfoo();";
        assert!(detaches_cleanly(source, Span::new(10, 14)));
        let source = "let b = a\nx();\n";
        assert!(detaches_cleanly(source, Span::new(10, 14)));
    }

    #[test]
    fn should_not_detach_when_neighbours_would_join() {
        for next in ["(f)()", "[1].forEach(g)", "`t`", "+1", "-1", "/re/.test(s)", "// c\n(f)()"] {
            let source = format!("let b = a\nx();\n{next}");
            assert!(!detaches_cleanly(&source, Span::new(10, 14)), "{next}");
        }
        let source = "const o = {}\nx();\n(f)()";
        assert!(!detaches_cleanly(source, Span::new(13, 17)));
    }

    #[test]
    fn should_recognize_pure_targets() {
        assert!(with_expr("Foo.prototype", is_pure_reference));
        assert!(with_expr("Foo", is_pure_reference));
        assert!(!with_expr("getFoo().prototype", is_pure_reference));
        assert!(!with_expr("Foo.bar", is_pure_reference));
    }
}
