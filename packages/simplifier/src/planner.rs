//! Rewrite Planner
//!
//! Turns a classified site and its verdicts into an [`EditPlan`]. Plans only
//! ever drop metadata entries or normalize an entry's own arguments; entry
//! order and parameter indices are never touched.

use oxc_span::Span;

use crate::analyzer::{EntryVerdict, Verdict};
use crate::config::Options;
use crate::model::{DecoratedMember, Descriptor, Entry, EntryId, MemberKind, MetadataKind, TextEdit};

#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Keep(EntryId),
    Drop { entry: EntryId, kind: MetadataKind },
    RewriteArgument { entry: EntryId, edits: Vec<TextEdit> },
}

impl EditOp {
    pub fn entry(&self) -> EntryId {
        match self {
            Self::Keep(entry) => *entry,
            Self::Drop { entry, .. } | Self::RewriteArgument { entry, .. } => *entry,
        }
    }
}

/// What happens to the decorator list as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLayout {
    /// Retained entries stay in place with their original formatting.
    Preserve,
    /// Everything was dropped; the list is emitted as `[]`.
    Flatten,
    /// Everything was dropped and the whole statement is removed.
    Collapse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditPlan {
    pub site: Span,
    /// One op per entry, in list order.
    pub ops: Vec<EditOp>,
    pub layout: ListLayout,
}

impl EditPlan {
    /// `true` when applying the plan would not change anything.
    pub fn is_noop(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, EditOp::Keep(_)))
    }

    pub fn is_dropped(&self, entry: EntryId) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, EditOp::Drop { entry: e, .. } if *e == entry))
    }

    pub fn dropped(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::Drop { .. }))
            .count()
    }

    pub fn rewritten(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, EditOp::RewriteArgument { .. }))
            .count()
    }
}

pub fn plan(member: &DecoratedMember, verdicts: &[EntryVerdict], options: &Options) -> EditPlan {
    let eligible = |id: EntryId| {
        verdicts
            .iter()
            .any(|v| v.entry == id && v.verdict == Verdict::EligibleForRemoval)
    };

    let ops: Vec<EditOp> = member
        .entries
        .iter()
        .map(|entry| match entry {
            Entry::Metadata(meta) if options.strip_metadata || eligible(meta.id) => EditOp::Drop {
                entry: meta.id,
                kind: meta.kind,
            },
            _ if !entry.rewrites().is_empty() => EditOp::RewriteArgument {
                entry: entry.id(),
                edits: entry.rewrites().to_vec(),
            },
            _ => EditOp::Keep(entry.id()),
        })
        .collect();

    let emptied = !ops.is_empty() && ops.iter().all(|op| matches!(op, EditOp::Drop { .. }));
    let layout = if !emptied {
        ListLayout::Preserve
    } else if options.collapse_empty_decorations && can_collapse(member) {
        ListLayout::Collapse
    } else {
        ListLayout::Flatten
    };

    EditPlan {
        site: member.site,
        ops,
        layout,
    }
}

/// A site can disappear entirely when nothing observes its evaluation: it is
/// its own statement, evaluating target and key runs no code, and with no
/// decorators the helper redefines the member with its own descriptor.
fn can_collapse(member: &DecoratedMember) -> bool {
    member.kind != MemberKind::Class
        && member.statement.is_some()
        && member.pure_target
        && matches!(member.descriptor, Descriptor::Null | Descriptor::Undefined)
}
