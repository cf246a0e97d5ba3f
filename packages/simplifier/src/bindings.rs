//! Per-unit binding index.
//!
//! One walk over the program collects what the classifier needs to resolve
//! names without a type checker:
//!
//! - which local names are the decorate / param / metadata helpers (by
//!   well-known name, by the structure of a local function declaration, or by
//!   aliasing one of those);
//! - which local names are bound to a module (`require`, `import`, interop
//!   wrappers), so decorator callees can be traced back to their package;
//! - the declared shape of every member of every named class.

use indexmap::IndexMap;
use oxc_ast::ast::{
    BindingPatternKind, Class, ClassElement, Expression, FormalParameters, Function,
    ImportDeclaration, ImportDeclarationSpecifier, MethodDefinitionKind, Program, Statement,
    StaticMemberExpression, VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::Span;

use crate::config::HelperNames;
use crate::model::{MemberKind, MemberShape};
use crate::syntax::{self, callee_target, member_path, property_key_name, unparen};

/// The three compiler helpers the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    Decorate,
    Param,
    Metadata,
}

/// Spellings emitted by tsc/tslib, SWC and Babel's TypeScript preset.
const WELL_KNOWN: &[(&str, Helper)] = &[
    ("_ts_decorate", Helper::Decorate),
    ("__decorate", Helper::Decorate),
    ("_ts_param", Helper::Param),
    ("__param", Helper::Param),
    ("_ts_metadata", Helper::Metadata),
    ("__metadata", Helper::Metadata),
];

fn well_known(name: &str) -> Option<Helper> {
    WELL_KNOWN
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, helper)| *helper)
}

/// What a local name was imported as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBinding {
    /// `const ns = require("m")`, `import * as ns from "m"`, `import ns from "m"`.
    Namespace(String),
    /// `import { imported as local } from "m"`.
    Named { module: String, imported: String },
}

#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    pub members: Vec<(String, bool, MemberShape)>,
    pub constructor: Option<MemberShape>,
}

impl ClassTable {
    /// Shape of the member with `key`; `None` when absent or ambiguous.
    pub fn member(&self, key: &str, is_static: bool) -> Option<MemberShape> {
        let mut found = self
            .members
            .iter()
            .filter(|(name, s, _)| name == key && *s == is_static)
            .map(|(_, _, shape)| shape);

        let first = found.next()?.clone();
        let mut merged = first;
        for other in found {
            // get/set pairs describe one accessor; any other duplicate is ambiguous.
            if merged.kind != MemberKind::Accessor || other.kind != MemberKind::Accessor {
                return None;
            }
            if other.param_count != Some(0) {
                merged.param_count = other.param_count;
            }
        }
        Some(merged)
    }
}

#[derive(Debug, Default)]
pub struct UnitIndex {
    helpers: IndexMap<String, Helper>,
    extra: Vec<(String, Helper)>,
    modules: IndexMap<String, ModuleBinding>,
    classes: IndexMap<String, Vec<(Span, ClassTable)>>,
}

impl UnitIndex {
    pub fn build(program: &Program<'_>, names: &HelperNames) -> Self {
        let mut collector = Collector::default();
        collector.visit_program(program);

        let mut index = UnitIndex {
            helpers: collector.helpers,
            extra: Vec::new(),
            modules: collector.modules,
            classes: collector.classes,
        };
        for name in &names.decorate {
            index.extra.push((name.clone(), Helper::Decorate));
        }
        for name in &names.param {
            index.extra.push((name.clone(), Helper::Param));
        }
        for name in &names.metadata {
            index.extra.push((name.clone(), Helper::Metadata));
        }
        index.resolve_aliases(collector.aliases);
        index
    }

    /// Aliases may chain (`const a = b; const b = __decorate`), so resolve
    /// until nothing changes. Each round resolves at least one alias or stops.
    fn resolve_aliases(&mut self, mut aliases: Vec<(String, String)>) {
        loop {
            let before = aliases.len();
            aliases.retain(|(local, target)| match self.helper_by_name(target) {
                Some(helper) => {
                    self.helpers.entry(local.clone()).or_insert(helper);
                    false
                }
                None => true,
            });
            if aliases.len() == before {
                break;
            }
        }
    }

    fn helper_by_name(&self, name: &str) -> Option<Helper> {
        self.helpers
            .get(name)
            .copied()
            .or_else(|| {
                self.extra
                    .iter()
                    .find(|(extra, _)| extra == name)
                    .map(|(_, helper)| *helper)
            })
            .or_else(|| well_known(name))
    }

    /// Which helper a callee expression refers to, if any.
    pub fn helper_of(&self, callee: &Expression<'_>) -> Option<Helper> {
        let path = member_path(callee_target(callee))?;
        match path.as_slice() {
            [name] => self.helper_by_name(name),
            // `tslib.__decorate`, `(0, tslib_1.__decorate)`: only well-known
            // names are trusted behind a namespace.
            [.., last] => well_known(last),
            [] => None,
        }
    }

    pub fn module_binding(&self, local: &str) -> Option<&ModuleBinding> {
        self.modules.get(local)
    }

    /// The unique class declared under `name`; `None` when absent or shadowed.
    pub fn class(&self, name: &str) -> Option<&ClassTable> {
        match self.classes.get(name).map(Vec::as_slice) {
            Some([(_, table)]) => Some(table),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Collector {
    helpers: IndexMap<String, Helper>,
    aliases: Vec<(String, String)>,
    modules: IndexMap<String, ModuleBinding>,
    classes: IndexMap<String, Vec<(Span, ClassTable)>>,
}

impl Collector {
    fn record_class(&mut self, name: &str, class: &Class<'_>) {
        let entries = self.classes.entry(name.to_string()).or_default();
        if entries.iter().any(|(span, _)| *span == class.span) {
            return;
        }
        entries.push((class.span, class_table(class)));
    }

    fn record_function(&mut self, name: &str, function: &Function<'_>) {
        if let Some(helper) = structural_helper(function) {
            self.helpers.insert(name.to_string(), helper);
        }
    }
}

impl<'a> Visit<'a> for Collector {
    fn visit_statement(&mut self, it: &Statement<'a>) {
        if let Statement::FunctionDeclaration(function) = it {
            if let Some(id) = &function.id {
                self.record_function(id.name.as_str(), function);
            }
        }
        walk::walk_statement(self, it);
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        if let Some(id) = &it.id {
            self.record_class(id.name.as_str(), it);
        }
        walk::walk_class(self, it);
    }

    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        if let (BindingPatternKind::BindingIdentifier(id), Some(init)) = (&it.id.kind, &it.init) {
            let local = id.name.as_str();
            match unparen(init) {
                Expression::ClassExpression(class) => self.record_class(local, class),
                Expression::FunctionExpression(function) => self.record_function(local, function),
                Expression::LogicalExpression(logical) => {
                    // tsc: `var __decorate = (this && this.__decorate) || function (...) {...}`
                    if let Expression::FunctionExpression(function) = unparen(&logical.right) {
                        self.record_function(local, function);
                    }
                }
                Expression::Identifier(target) => {
                    self.aliases
                        .push((local.to_string(), target.name.to_string()));
                }
                Expression::StaticMemberExpression(_) => {
                    if let Some(path) = member_path(init) {
                        if let Some(helper) = path.last().and_then(|last| well_known(last)) {
                            self.helpers.insert(local.to_string(), helper);
                        }
                    }
                }
                _ => {
                    if let Some(module) = required_module(init) {
                        self.modules
                            .insert(local.to_string(), ModuleBinding::Namespace(module));
                    }
                }
            }
        }
        walk::walk_variable_declarator(self, it);
    }

    fn visit_import_declaration(&mut self, it: &ImportDeclaration<'a>) {
        let module = it.source.value.to_string();
        if let Some(specifiers) = &it.specifiers {
            for spec in specifiers {
                match spec {
                    ImportDeclarationSpecifier::ImportSpecifier(named) => {
                        let imported = named.imported.name().to_string();
                        if module == "tslib" {
                            if let Some(helper) = well_known(&imported) {
                                self.helpers.insert(named.local.name.to_string(), helper);
                            }
                        }
                        self.modules.insert(
                            named.local.name.to_string(),
                            ModuleBinding::Named {
                                module: module.clone(),
                                imported,
                            },
                        );
                    }
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                        self.modules.insert(
                            default.local.name.to_string(),
                            ModuleBinding::Namespace(module.clone()),
                        );
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => {
                        self.modules.insert(
                            ns.local.name.to_string(),
                            ModuleBinding::Namespace(module.clone()),
                        );
                    }
                }
            }
        }
        walk::walk_import_declaration(self, it);
    }
}

/// `require("m")`, optionally wrapped in interop helpers such as
/// `_interop_require_default(require("m"))` or `__importStar(require("m"))`.
fn required_module(expr: &Expression<'_>) -> Option<String> {
    let Expression::CallExpression(call) = unparen(expr) else {
        return None;
    };
    let path = member_path(callee_target(&call.callee))?;
    let name = *path.last()?;
    let arg = match &call.arguments[..] {
        [arg] => syntax::argument_expression(arg)?,
        _ => return None,
    };
    if name == "require" && path.len() == 1 {
        return syntax::string_value(arg).map(str::to_string);
    }
    if name.starts_with("_interop_require") || name.starts_with("__import") {
        return required_module(arg);
    }
    None
}

fn param_count(params: &FormalParameters<'_>) -> Option<usize> {
    if params.rest.is_some() {
        None
    } else {
        Some(params.items.len())
    }
}

fn function_shape(kind: MemberKind, function: &Function<'_>) -> MemberShape {
    MemberShape {
        kind,
        param_count: param_count(&function.params),
        is_async: function.r#async,
        is_generator: function.generator,
        initializer: None,
    }
}

fn class_table(class: &Class<'_>) -> ClassTable {
    let mut table = ClassTable::default();
    for element in &class.body.body {
        match element {
            ClassElement::MethodDefinition(method) => {
                let kind = match method.kind {
                    MethodDefinitionKind::Constructor => {
                        table.constructor = Some(function_shape(MemberKind::Class, &method.value));
                        continue;
                    }
                    MethodDefinitionKind::Method => MemberKind::Method,
                    MethodDefinitionKind::Get | MethodDefinitionKind::Set => MemberKind::Accessor,
                };
                if let Some(name) = property_key_name(&method.key, method.computed) {
                    table
                        .members
                        .push((name, method.r#static, function_shape(kind, &method.value)));
                }
            }
            ClassElement::PropertyDefinition(prop) => {
                if let Some(name) = property_key_name(&prop.key, prop.computed) {
                    let shape = MemberShape {
                        kind: MemberKind::Property,
                        param_count: Some(0),
                        is_async: false,
                        is_generator: false,
                        initializer: prop.value.as_ref().and_then(syntax::literal_kind),
                    };
                    table.members.push((name, prop.r#static, shape));
                }
            }
            ClassElement::AccessorProperty(prop) => {
                if let Some(name) = property_key_name(&prop.key, prop.computed) {
                    let shape = MemberShape {
                        kind: MemberKind::Accessor,
                        param_count: Some(0),
                        is_async: false,
                        is_generator: false,
                        initializer: None,
                    };
                    table.members.push((name, prop.r#static, shape));
                }
            }
            _ => {}
        }
    }
    table
}

/// Recognize a helper implementation by its structure, whatever it is called.
fn structural_helper(function: &Function<'_>) -> Option<Helper> {
    let arity = function.params.items.len();
    if function.params.rest.is_some() {
        return None;
    }
    let body = function.body.as_ref()?;

    let mut reflect = ReflectUse::default();
    for stmt in &body.statements {
        reflect.visit_statement(stmt);
    }

    match arity {
        4 if reflect.decorate => Some(Helper::Decorate),
        2 if reflect.metadata => Some(Helper::Metadata),
        2 if returns_two_parameter_function(&body.statements) => Some(Helper::Param),
        _ => None,
    }
}

fn returns_two_parameter_function(statements: &[Statement<'_>]) -> bool {
    let [Statement::ReturnStatement(ret)] = statements else {
        return false;
    };
    match ret.argument.as_ref().map(unparen) {
        Some(Expression::FunctionExpression(inner)) => {
            inner.params.items.len() == 2 && inner.params.rest.is_none()
        }
        Some(Expression::ArrowFunctionExpression(inner)) => {
            inner.params.items.len() == 2 && inner.params.rest.is_none()
        }
        _ => false,
    }
}

#[derive(Default)]
struct ReflectUse {
    decorate: bool,
    metadata: bool,
}

impl<'a> Visit<'a> for ReflectUse {
    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if let Expression::Identifier(object) = unparen(&it.object) {
            if object.name == "Reflect" {
                match it.property.name.as_str() {
                    "decorate" => self.decorate = true,
                    "metadata" => self.metadata = true,
                    _ => {}
                }
            }
        }
        walk::walk_static_member_expression(self, it);
    }
}
