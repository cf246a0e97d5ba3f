//! Metadata Usage Analyzer
//!
//! Decides, for each `design:*` entry of a classified site, whether removing it
//! is safe. An entry is only ever eligible when every decorator in the list is
//! known to ignore its kind *and* the value carries no information beyond what
//! the member's own declaration already says.

use crate::config::Options;
use crate::model::{
    DecoratedMember, EntryId, MemberKind, MemberShape, MetadataEntry, MetadataKind, TypeExpr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    EligibleForRemoval,
    MustKeep,
    /// The declaration could not be located; treated like `MustKeep`.
    Unknown,
}

/// Why a verdict was reached. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A decoration in the list may read this kind.
    MayBeRead,
    /// `design:type` is `Function` on a method.
    FunctionOnMethod,
    /// `design:returntype` is `Promise` on an async method.
    PromiseOnAsyncMethod,
    /// `design:paramtypes` lists only placeholders, one per declared parameter.
    PlaceholderParameters,
    /// `design:type` matches the property's literal initializer.
    LiteralInitializer,
    /// The value is a configured placeholder type.
    Placeholder,
    /// The value could be reproducible but the declaration was not found.
    DeclarationMissing,
    /// The value carries type information the declaration does not.
    Concrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryVerdict {
    pub entry: EntryId,
    pub kind: MetadataKind,
    pub verdict: Verdict,
    pub reason: Reason,
}

/// Verdicts for every metadata entry of `member`, in list order.
pub fn analyze(member: &DecoratedMember, options: &Options) -> Vec<EntryVerdict> {
    member
        .metadata()
        .map(|entry| {
            let (verdict, reason) = judge(member, entry, options);
            tracing::trace!(
                site = %member.label(),
                kind = %entry.kind,
                ?verdict,
                ?reason,
                "metadata verdict"
            );
            EntryVerdict {
                entry: entry.id,
                kind: entry.kind,
                verdict,
                reason,
            }
        })
        .collect()
}

fn judge(member: &DecoratedMember, entry: &MetadataEntry, options: &Options) -> (Verdict, Reason) {
    let read = member
        .decorations()
        .any(|d| !options.ignored_kinds(&d.identity).contains_kind(entry.kind));
    if read {
        return (Verdict::MustKeep, Reason::MayBeRead);
    }

    let shape = member.shape.as_ref();
    match entry.kind {
        MetadataKind::Type => judge_type(&entry.value, shape, options),
        MetadataKind::ParamTypes => judge_param_types(&entry.value, shape, options),
        MetadataKind::ReturnType => judge_return_type(&entry.value, shape),
    }
}

fn judge_type(value: &TypeExpr, shape: Option<&MemberShape>, options: &Options) -> (Verdict, Reason) {
    let Some(name) = value.reference_name() else {
        return (Verdict::MustKeep, Reason::Concrete);
    };
    if options.is_placeholder(name) {
        return (Verdict::EligibleForRemoval, Reason::Placeholder);
    }

    let reproducible_from = |shape: &MemberShape| match name {
        "Function" => (shape.kind == MemberKind::Method).then_some(Reason::FunctionOnMethod),
        _ => match (shape.kind, shape.initializer) {
            (MemberKind::Property, Some(literal)) if literal.wrapper_name() == name => {
                Some(Reason::LiteralInitializer)
            }
            _ => None,
        },
    };

    match shape {
        Some(shape) => match reproducible_from(shape) {
            Some(reason) => (Verdict::EligibleForRemoval, reason),
            None => (Verdict::MustKeep, Reason::Concrete),
        },
        None if is_reproducible_name(name) => (Verdict::Unknown, Reason::DeclarationMissing),
        None => (Verdict::MustKeep, Reason::Concrete),
    }
}

/// Names a declaration alone can produce as `design:type`.
fn is_reproducible_name(name: &str) -> bool {
    matches!(name, "Function" | "Number" | "String" | "Boolean" | "BigInt")
}

fn judge_param_types(
    value: &TypeExpr,
    shape: Option<&MemberShape>,
    options: &Options,
) -> (Verdict, Reason) {
    let TypeExpr::Tuple(items) = value else {
        return (Verdict::MustKeep, Reason::Concrete);
    };
    let all_placeholders = items
        .iter()
        .all(|item| item.reference_name().is_some_and(|name| options.is_placeholder(name)));
    if !all_placeholders {
        return (Verdict::MustKeep, Reason::Concrete);
    }

    match shape {
        Some(shape) if shape.param_count == Some(items.len()) => {
            (Verdict::EligibleForRemoval, Reason::PlaceholderParameters)
        }
        Some(_) => (Verdict::MustKeep, Reason::Concrete),
        None => (Verdict::Unknown, Reason::DeclarationMissing),
    }
}

fn judge_return_type(value: &TypeExpr, shape: Option<&MemberShape>) -> (Verdict, Reason) {
    if value.reference_name() != Some("Promise") {
        return (Verdict::MustKeep, Reason::Concrete);
    }
    match shape {
        Some(shape) if shape.kind == MemberKind::Method && shape.is_async && !shape.is_generator => {
            (Verdict::EligibleForRemoval, Reason::PromiseOnAsyncMethod)
        }
        Some(_) => (Verdict::MustKeep, Reason::Concrete),
        None => (Verdict::Unknown, Reason::DeclarationMissing),
    }
}
