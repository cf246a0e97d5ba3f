//! AST Rewriter / Emitter
//!
//! Plans are realized as text edits over spans of the original source, so
//! everything a plan does not touch is emitted byte-for-byte. Each site's
//! edits are checked by re-parsing and re-classifying the rewritten call
//! before they are accepted.

use std::collections::BTreeMap;

use oxc_allocator::Allocator;
use oxc_ast::ast::Expression;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::bindings::{Helper, UnitIndex};
use crate::classifier::classify_call;
use crate::config::Options;
use crate::error::RewriteConflict;
use crate::model::{apply_edits, DecoratedMember, MetadataKind, Site, TextEdit};
use crate::planner::{EditOp, EditPlan, ListLayout};
use crate::syntax::{self, unparen};

/// What the rewriter needs to re-classify a rewritten site.
pub struct Rewriter<'s> {
    pub source: &'s str,
    pub source_type: SourceType,
    pub index: &'s UnitIndex,
    pub options: &'s Options,
}

impl<'s> Rewriter<'s> {
    /// The text edits realizing `plan`, or the reason they cannot be trusted.
    pub fn site_edits(
        &self,
        member: &DecoratedMember,
        plan: &EditPlan,
    ) -> Result<Vec<TextEdit>, RewriteConflict> {
        match plan.layout {
            ListLayout::Collapse => {
                let Some(statement) = member.statement else {
                    return Err(RewriteConflict::LostShape);
                };
                return Ok(vec![TextEdit::delete(whole_lines(self.source, statement))]);
            }
            ListLayout::Flatten => {
                let edits = vec![TextEdit::new(member.list, "[]")];
                self.validate(member, plan, &edits)?;
                Ok(edits)
            }
            ListLayout::Preserve => {
                let edits = list_edits(member, plan);
                self.validate(member, plan, &edits)?;
                Ok(edits)
            }
        }
    }

    fn validate(
        &self,
        member: &DecoratedMember,
        plan: &EditPlan,
        edits: &[TextEdit],
    ) -> Result<(), RewriteConflict> {
        let original = syntax::text(self.source, member.site);
        let snippet = apply_edits(original, member.site.start, edits);

        let allocator = Allocator::default();
        let expr = Parser::new(&allocator, &snippet, self.source_type)
            .parse_expression()
            .map_err(|errors| {
                RewriteConflict::InvalidSyntax(
                    errors.first().map(|e| e.to_string()).unwrap_or_default(),
                )
            })?;

        let Expression::CallExpression(call) = unparen(&expr) else {
            return Err(RewriteConflict::LostShape);
        };
        if self.index.helper_of(&call.callee) != Some(Helper::Decorate) {
            return Err(RewriteConflict::LostShape);
        }
        let Site::Member(rewritten) = classify_call(call, None, &snippet, self.index, self.options)
        else {
            return Err(RewriteConflict::LostShape);
        };

        let expected: Vec<(Option<u32>, String)> = member
            .decorations()
            .map(|d| {
                let text = syntax::text(self.source, d.span);
                let text = match plan.ops.iter().find(|op| op.entry() == d.id) {
                    Some(EditOp::RewriteArgument { edits, .. }) => {
                        apply_edits(text, d.span.start, edits)
                    }
                    _ => text.to_string(),
                };
                (d.param_index, text)
            })
            .collect();
        let found: Vec<(Option<u32>, &str)> = rewritten
            .decorations()
            .map(|d| (d.param_index, syntax::text(&snippet, d.span)))
            .collect();

        if expected.len() != found.len() {
            return Err(RewriteConflict::DecorationsChanged);
        }
        for ((expected_index, expected_text), (found_index, found_text)) in
            expected.iter().zip(&found)
        {
            match (expected_index, found_index) {
                (Some(expected), Some(found)) if expected != found => {
                    return Err(RewriteConflict::ParameterIndexChanged {
                        expected: *expected,
                        found: *found,
                    });
                }
                (Some(_), None) | (None, Some(_)) => return Err(RewriteConflict::DecorationsChanged),
                _ => {}
            }
            if expected_text != found_text {
                return Err(RewriteConflict::DecorationsChanged);
            }
        }

        let retained: Vec<MetadataKind> = member
            .metadata()
            .filter(|m| !plan.is_dropped(m.id))
            .map(|m| m.kind)
            .collect();
        let found: Vec<MetadataKind> = rewritten.metadata().map(|m| m.kind).collect();
        if retained != found {
            return Err(RewriteConflict::DecorationsChanged);
        }

        Ok(())
    }
}

/// Deletions for every run of dropped entries plus the planned argument
/// rewrites. A run takes the separator after it, or the one before it when it
/// ends the list.
fn list_edits(member: &DecoratedMember, plan: &EditPlan) -> Vec<TextEdit> {
    let entries = &member.entries;
    let mut edits = Vec::new();

    let mut i = 0;
    while i < entries.len() {
        if !plan.is_dropped(entries[i].id()) {
            i += 1;
            continue;
        }
        let mut j = i;
        while j + 1 < entries.len() && plan.is_dropped(entries[j + 1].id()) {
            j += 1;
        }
        let span = match (i.checked_sub(1), entries.get(j + 1)) {
            (_, Some(next)) => Span::new(entries[i].span().start, next.span().start),
            (Some(prev), None) => Span::new(entries[prev].span().end, entries[j].span().end),
            (None, None) => Span::new(entries[i].span().start, entries[j].span().end),
        };
        edits.push(TextEdit::delete(span));
        i = j + 1;
    }

    for op in &plan.ops {
        if let EditOp::RewriteArgument { edits: rewrites, .. } = op {
            edits.extend(rewrites.iter().cloned());
        }
    }
    edits
}

/// Widen a statement span to its whole line(s) when nothing else shares them.
fn whole_lines(source: &str, span: Span) -> Span {
    let bytes = source.as_bytes();

    let mut start = span.start as usize;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    let mut end = span.end as usize;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t' | b'\r') {
        end += 1;
    }

    let line_start = start == 0 || bytes[start - 1] == b'\n';
    let line_end = end == bytes.len() || bytes[end] == b'\n';
    if !(line_start && line_end) {
        return span;
    }
    if end < bytes.len() {
        end += 1;
    }
    Span::new(start as u32, end as u32)
}

/// Collects accepted site edits and splices them into the source.
#[derive(Debug, Default)]
pub struct Emitter {
    /// start -> end of every queued edit; queued edits never overlap.
    occupied: BTreeMap<u32, u32>,
    edits: Vec<TextEdit>,
}

impl Emitter {
    /// Queue one site's edits. A site whose edits overlap anything already
    /// queued (an enclosing site that replaced its text) is skipped as a whole.
    pub fn push(&mut self, edits: Vec<TextEdit>) -> bool {
        if edits.iter().any(|edit| self.overlaps(edit.span)) {
            return false;
        }
        for edit in &edits {
            self.occupied.insert(edit.span.start, edit.span.end);
        }
        self.edits.extend(edits);
        true
    }

    fn overlaps(&self, span: Span) -> bool {
        self.occupied
            .range(..span.end.max(span.start + 1))
            .next_back()
            .is_some_and(|(_, end)| *end > span.start)
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn finish(mut self, source: &str) -> String {
        // Apply back to front so earlier offsets stay valid.
        self.edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));

        let mut code = source.to_string();
        for edit in self.edits {
            code.replace_range(edit.span.start as usize..edit.span.end as usize, &edit.text);
        }
        code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::model::{EntryId, MetadataKind};
    use oxc_span::SourceType;

    const SITE: &str = r#"_ts_decorate([Get(), _ts_param(0, Body()), _ts_metadata("design:type", Function)], C.prototype, "m", null);"#;

    /// Run `site_edits` on the first site of `source` with the given ops.
    fn edits_for(
        source: &str,
        ops: impl FnOnce(&DecoratedMember) -> Vec<EditOp>,
    ) -> Result<Vec<TextEdit>, RewriteConflict> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        assert!(ret.errors.is_empty(), "Parse errors: {:?}", ret.errors);
        let options = Options::default();
        let index = UnitIndex::build(&ret.program, &options.helper_names);
        let sites = classify(&ret.program, source, &index, &options);
        let Some(Site::Member(member)) = sites.first() else {
            panic!("expected a member site in {source}");
        };

        let plan = EditPlan {
            site: member.site,
            ops: ops(member),
            layout: ListLayout::Preserve,
        };
        let rewriter = Rewriter {
            source,
            source_type: SourceType::mjs(),
            index: &index,
            options: &options,
        };
        rewriter.site_edits(member, &plan)
    }

    fn keep_all_but(member: &DecoratedMember, id: u32, op: EditOp) -> Vec<EditOp> {
        member
            .entries
            .iter()
            .map(|e| if e.id() == EntryId(id) { op.clone() } else { EditOp::Keep(e.id()) })
            .collect()
    }

    fn rewrite(member: &DecoratedMember, id: u32, from: usize, len: usize, text: &str) -> Vec<EditOp> {
        let start = member.entries[id as usize].span().start + from as u32;
        let edit = TextEdit::new(Span::new(start, start + len as u32), text);
        keep_all_but(
            member,
            id,
            EditOp::RewriteArgument {
                entry: EntryId(id),
                edits: vec![edit],
            },
        )
    }

    #[test]
    fn should_accept_a_plain_metadata_drop() {
        let edits = edits_for(SITE, |m| {
            keep_all_but(
                m,
                2,
                EditOp::Drop {
                    entry: EntryId(2),
                    kind: MetadataKind::Type,
                },
            )
        })
        .unwrap();
        assert_eq!(edits.len(), 1);
    }

    #[test]
    fn should_reject_dropping_a_decorator() {
        let result = edits_for(SITE, |m| {
            keep_all_but(
                m,
                0,
                EditOp::Drop {
                    entry: EntryId(0),
                    kind: MetadataKind::Type,
                },
            )
        });
        assert_eq!(result, Err(RewriteConflict::DecorationsChanged));
    }

    #[test]
    fn should_reject_rewrites_that_break_syntax() {
        // `Get()` -> `Get(`
        let result = edits_for(SITE, |m| rewrite(m, 0, 0, 5, "Get("));
        assert!(matches!(result, Err(RewriteConflict::InvalidSyntax(_))), "{result:?}");
    }

    #[test]
    fn should_reject_rewrites_that_move_parameter_indices() {
        // `_ts_param(0, ...)` -> `_ts_param(1, ...)`
        let result = edits_for(SITE, |m| rewrite(m, 1, "_ts_param(".len(), 1, "1"));
        assert_eq!(
            result,
            Err(RewriteConflict::ParameterIndexChanged {
                expected: 0,
                found: 1
            })
        );
    }

    #[test]
    fn should_reject_rewrites_that_make_the_site_unrecognizable() {
        // `Get()` -> `...Get()`, which classifies as opaque.
        let result = edits_for(SITE, |m| rewrite(m, 0, 0, 0, "..."));
        assert_eq!(result, Err(RewriteConflict::LostShape));
    }

    #[test]
    fn should_widen_collapsed_statements_to_whole_lines() {
        let source = "a();\n  b();\nc();";
        assert_eq!(whole_lines(source, Span::new(7, 11)), Span::new(5, 12));
        assert_eq!(whole_lines(source, Span::new(12, 16)), Span::new(12, 16));
    }

    #[test]
    fn should_not_widen_shared_lines() {
        let source = "a(); b();\n";
        assert_eq!(whole_lines(source, Span::new(5, 9)), Span::new(5, 9));
    }

    #[test]
    fn should_handle_crlf_line_endings() {
        let source = "a();\r\nb();\r\nc();";
        assert_eq!(whole_lines(source, Span::new(6, 10)), Span::new(6, 12));
    }

    #[test]
    fn should_skip_overlapping_sites() {
        let mut emitter = Emitter::default();
        assert!(emitter.push(vec![TextEdit::new(Span::new(10, 20), "[]")]));
        assert!(!emitter.push(vec![TextEdit::delete(Span::new(12, 15))]));
        assert!(!emitter.push(vec![TextEdit::delete(Span::new(5, 11))]));
        assert!(emitter.push(vec![TextEdit::delete(Span::new(20, 22))]));
        assert!(emitter.push(vec![TextEdit::delete(Span::new(0, 10))]));
    }

    #[test]
    fn should_splice_edits_back_to_front() {
        let mut emitter = Emitter::default();
        emitter.push(vec![TextEdit::new(Span::new(0, 1), "xyz")]);
        emitter.push(vec![TextEdit::delete(Span::new(2, 4))]);
        assert_eq!(emitter.finish("a b c"), "xyz c");
    }
}
