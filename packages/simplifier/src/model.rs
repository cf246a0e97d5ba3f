//! Data model shared by the classifier, analyzer, planner and rewriter.
//!
//! Everything here is built per compilation unit and dropped once the
//! rewritten text has been produced.

use bitflags::bitflags;
use oxc_span::Span;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The three reflection metadata kinds the compiler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetadataKind {
    #[serde(rename = "type")]
    Type,
    #[serde(rename = "paramtypes")]
    ParamTypes,
    #[serde(rename = "returntype")]
    ReturnType,
}

impl MetadataKind {
    pub const ALL: [MetadataKind; 3] = [Self::Type, Self::ParamTypes, Self::ReturnType];

    /// Map a metadata key string (`"design:type"`, ...) to its kind.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "design:type" => Some(Self::Type),
            "design:paramtypes" => Some(Self::ParamTypes),
            "design:returntype" => Some(Self::ReturnType),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Type => "design:type",
            Self::ParamTypes => "design:paramtypes",
            Self::ReturnType => "design:returntype",
        }
    }

    pub fn flag(self) -> MetadataKinds {
        match self {
            Self::Type => MetadataKinds::TYPE,
            Self::ParamTypes => MetadataKinds::PARAMTYPES,
            Self::ReturnType => MetadataKinds::RETURNTYPE,
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

bitflags! {
    /// A set of metadata kinds, e.g. the kinds a decorator is known to ignore.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MetadataKinds: u8 {
        const TYPE = 1 << 0;
        const PARAMTYPES = 1 << 1;
        const RETURNTYPE = 1 << 2;
    }
}

impl MetadataKinds {
    pub fn contains_kind(self, kind: MetadataKind) -> bool {
        self.contains(kind.flag())
    }
}

impl FromIterator<MetadataKind> for MetadataKinds {
    fn from_iter<I: IntoIterator<Item = MetadataKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MetadataKinds::empty(), |acc, kind| acc | kind.flag())
    }
}

/// What kind of class element a decoration site targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Property,
    Accessor,
    /// `C = decorate([...], C)`: decorators applied to the class itself.
    Class,
}

/// Stable handle of one element of a decoration list.
///
/// Handles are assigned in source order when a site is classified and never
/// change afterwards, so edits can refer to entries without relying on
/// positions that shift as siblings are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

/// Who a decorator is, as far as syntax can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoratorIdentity {
    /// Resolved to an exported name, optionally with the module it came from.
    Named { module: Option<String>, name: String },
    /// A reflection metadata call with a non-design key. It only writes.
    MetadataHelper,
    /// Anything else: computed callees, inline functions, ...
    Unresolved,
}

impl DecoratorIdentity {
    pub fn named(module: Option<&str>, name: &str) -> Self {
        Self::Named {
            module: module.map(str::to_string),
            name: name.to_string(),
        }
    }
}

/// Replace the source text under `span` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub text: String,
}

impl TextEdit {
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    pub fn delete(span: Span) -> Self {
        Self::new(span, String::new())
    }
}

/// Apply non-overlapping edits to `text`, whose first byte sits at `base`
/// in the original source.
pub fn apply_edits(text: &str, base: u32, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| (e.span.start, e.span.end));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for edit in sorted {
        let start = (edit.span.start - base) as usize;
        let end = (edit.span.end - base) as usize;
        out.push_str(&text[cursor..start]);
        out.push_str(&edit.text);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// One decorator application inside a decoration list.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub id: EntryId,
    pub span: Span,
    /// Set for parameter decorators: the index into the declared parameter list.
    pub param_index: Option<u32>,
    pub identity: DecoratorIdentity,
    /// Opt-in argument normalizations found inside this decoration.
    pub rewrites: Vec<TextEdit>,
}

/// Structural view of an emitted metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A bare identifier such as `Function`, `Object` or `UserDto`.
    Reference(String),
    /// A dotted path such as `mongoose.Types.ObjectId`.
    Qualified(String),
    /// `void 0` or `undefined`.
    Void,
    /// An array literal of type expressions (`design:paramtypes`).
    Tuple(Vec<TypeExpr>),
    /// Conditionals, calls and everything else.
    Other,
}

impl TypeExpr {
    pub fn reference_name(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            _ => None,
        }
    }
}

/// One `design:*` metadata emission inside a decoration list.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub id: EntryId,
    pub span: Span,
    pub kind: MetadataKind,
    pub value: TypeExpr,
    pub value_span: Span,
    /// Opt-in value normalizations (typeof guard simplification).
    pub rewrites: Vec<TextEdit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Decoration(Decoration),
    Metadata(MetadataEntry),
}

impl Entry {
    pub fn id(&self) -> EntryId {
        match self {
            Self::Decoration(d) => d.id,
            Self::Metadata(m) => m.id,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Decoration(d) => d.span,
            Self::Metadata(m) => m.span,
        }
    }

    pub fn rewrites(&self) -> &[TextEdit] {
        match self {
            Self::Decoration(d) => &d.rewrites,
            Self::Metadata(m) => &m.rewrites,
        }
    }

    pub fn as_metadata(&self) -> Option<&MetadataEntry> {
        match self {
            Self::Metadata(m) => Some(m),
            Self::Decoration(_) => None,
        }
    }

    pub fn as_decoration(&self) -> Option<&Decoration> {
        match self {
            Self::Decoration(d) => Some(d),
            Self::Metadata(_) => None,
        }
    }
}

/// Primitive kind of a property's literal initializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Boolean,
    BigInt,
}

impl LiteralKind {
    /// The constructor the compiler emits as `design:type` for this literal.
    pub fn wrapper_name(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::BigInt => "BigInt",
        }
    }
}

/// The declared shape of a class member, read off the class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberShape {
    pub kind: MemberKind,
    /// Declared parameter count; `None` when a rest parameter is present.
    pub param_count: Option<usize>,
    pub is_async: bool,
    pub is_generator: bool,
    pub initializer: Option<LiteralKind>,
}

/// The fourth argument of a member decoration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor {
    /// `null`: the helper looks the descriptor up itself (methods, accessors).
    Null,
    /// `void 0` or `undefined`: no descriptor (properties).
    Undefined,
    /// Any other expression, e.g. an explicit `Object.getOwnPropertyDescriptor(...)`.
    Expression,
    /// Class-level sites have no descriptor argument.
    Absent,
}

/// One classified decoration site.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedMember {
    /// The whole helper call.
    pub site: Span,
    /// The array literal holding the decorators.
    pub list: Span,
    /// The enclosing statement when it consists of nothing but this call and
    /// deleting it cannot join the code around it.
    pub statement: Option<Span>,
    pub class_name: Option<String>,
    pub is_static: bool,
    /// `None` for class-level sites.
    pub key: Option<String>,
    pub kind: MemberKind,
    pub descriptor: Descriptor,
    /// `true` when target and key are side-effect free to evaluate.
    pub pure_target: bool,
    pub shape: Option<MemberShape>,
    pub entries: SmallVec<[Entry; 6]>,
}

impl DecoratedMember {
    pub fn decorations(&self) -> impl Iterator<Item = &Decoration> {
        self.entries.iter().filter_map(Entry::as_decoration)
    }

    pub fn metadata(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.entries.iter().filter_map(Entry::as_metadata)
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Human-readable label used in logs, e.g. `MenuResolver.prototype.status`.
    pub fn label(&self) -> String {
        let class = self.class_name.as_deref().unwrap_or("<anonymous>");
        match (&self.key, self.is_static) {
            (Some(key), true) => format!("{class}.{key}"),
            (Some(key), false) => format!("{class}.prototype.{key}"),
            (None, _) => class.to_string(),
        }
    }
}

/// Why a site that looked like a decoration call was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrecognizedShape {
    /// Argument count does not match the member (4) or class (2) form.
    WrongArity,
    /// The decorator list is not an array literal.
    NotAnArray,
    /// The decorator list contains a spread element or a hole.
    SpreadOrHole,
    /// The member key is not a string literal.
    KeyNotLiteral,
    /// A parameter wrapper without exactly two arguments.
    ParamArity,
    /// A parameter wrapper whose index is not a non-negative integer literal.
    ParamIndexNotLiteral,
    /// A metadata call without exactly two arguments.
    MetadataArity,
    /// A metadata call whose key is not a string literal.
    MetadataKeyNotLiteral,
    /// The same design metadata kind appears twice.
    DuplicateMetadata,
}

/// Classifier output for one helper call.
#[derive(Debug, Clone, PartialEq)]
pub enum Site {
    Member(DecoratedMember),
    Opaque {
        span: Span,
        reason: UnrecognizedShape,
    },
}

impl Site {
    pub fn span(&self) -> Span {
        match self {
            Self::Member(m) => m.site,
            Self::Opaque { span, .. } => *span,
        }
    }
}
