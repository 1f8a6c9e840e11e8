//! Scope and symbol table for JavaScript programs.
//!
//! Every binding (variable, parameter, function, class, catch parameter,
//! import) becomes a [`Symbol`] owned by the scope that declares it. Every
//! identifier reference is resolved through the scope chain to the symbol it
//! reads or writes; references that resolve nowhere are free (globals).
//!
//! The table is built in two passes over the tree: the first creates scopes
//! and declares bindings (so hoisted `var` and function declarations are
//! visible before their textual position), the second resolves references.
//! ERROR subtrees are skipped by both passes.

use crate::js::node::{children, is_function_like, named_children, named_kind, text};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tree_sitter::Node;

pub type ScopeId = usize;
pub type SymbolId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    Function,
    Block,
    Class,
    Catch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Function,
    Class,
    Param,
    CatchParam,
    Import,
}

/// How an identifier occurrence is spelled, which decides how a rename must
/// rewrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A plain identifier: replaced in place.
    Plain,
    /// `{ name }` in an object literal: expands to `{ name: renamed }`.
    ShorthandProperty,
    /// `{ name }` in a destructuring pattern: expands to `{ name: renamed }`.
    ShorthandPattern,
    /// `export { name }`: becomes `export { renamed as name }`.
    ExportSpecifier,
    /// A binding inside an import statement; the import rewrite emits it.
    ImportBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub range: Range<usize>,
    pub shape: Shape,
}

/// `export <declaration>` outside a default export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDeclaration {
    /// From the `export` keyword up to the declaration.
    pub keyword: Range<usize>,
    /// End of the whole statement.
    pub end: usize,
    /// Names bound by the declaration, in source order.
    pub bindings: Vec<(String, Range<usize>)>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: BindingKind,
    pub scope: ScopeId,
    pub declarations: Vec<Occurrence>,
    pub references: Vec<Occurrence>,
}

impl Symbol {
    /// Declarations followed by references.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.declarations.iter().chain(self.references.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub range: Range<usize>,
    names: HashMap<String, SymbolId>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }
}

/// The resolved scope structure of one program.
#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    /// tree-sitter node id -> scope, for scope-opening nodes
    node_scopes: HashMap<usize, ScopeId>,
    binding_nodes: HashSet<usize>,
    free: Vec<(String, Range<usize>)>,
    names: HashSet<String>,
    exports: Vec<ExportedDeclaration>,
}

impl ScopeTree {
    /// Build the scope table for a parsed program.
    pub fn build(root: Node<'_>, source: &str) -> Self {
        let mut tree = ScopeTree::default();
        let program = tree.push_scope(ScopeKind::Program, None, root.byte_range());
        tree.node_scopes.insert(root.id(), program);

        for child in children(root) {
            tree.declare(child, program, source);
        }
        for child in children(root) {
            tree.resolve(child, program, source);
        }
        tree
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn program_scope(&self) -> &Scope {
        &self.scopes[0]
    }

    /// All symbols declared with `name`, in declaration order.
    pub fn symbols_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = SymbolId> + 'a {
        self.symbols
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.name == name)
            .map(|(id, _)| id)
    }

    /// Resolve `name` starting from `scope` and walking outwards.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if let Some(sym) = s.get(name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }

    /// References that resolved to no binding.
    pub fn free_references(&self) -> &[(String, Range<usize>)] {
        &self.free
    }

    pub fn exported_declarations(&self) -> &[ExportedDeclaration] {
        &self.exports
    }

    /// Whether any identifier anywhere in the program is spelled `name`.
    pub fn mentions(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Every identifier spelling seen in the program.
    pub fn identifier_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, range: Range<usize>) -> ScopeId {
        self.scopes.push(Scope {
            kind,
            parent,
            range,
            names: HashMap::new(),
        });
        self.scopes.len() - 1
    }

    /// Nearest enclosing scope that `var` hoists to.
    fn hoist_target(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let s = &self.scopes[current];
            match (s.kind, s.parent) {
                (ScopeKind::Program | ScopeKind::Function, _) | (_, None) => return current,
                (_, Some(parent)) => current = parent,
            }
        }
    }

    fn scope_kind_for(node: Node<'_>) -> Option<ScopeKind> {
        if is_function_like(node) {
            return Some(ScopeKind::Function);
        }
        match named_kind(node) {
            "class_static_block" => Some(ScopeKind::Function),
            "class_declaration" | "class" => Some(ScopeKind::Class),
            "catch_clause" => Some(ScopeKind::Catch),
            "for_statement" | "for_in_statement" | "switch_body" => Some(ScopeKind::Block),
            "statement_block" => {
                // A function body shares the function's scope with its parameters
                let is_body = node
                    .parent()
                    .is_some_and(|p| Self::scope_kind_for(p) == Some(ScopeKind::Function));
                (!is_body).then_some(ScopeKind::Block)
            }
            _ => None,
        }
    }

    fn bind(&mut self, scope: ScopeId, node: Node<'_>, source: &str, kind: BindingKind, shape: Shape) {
        let name = text(node, source).to_string();
        self.names.insert(name.clone());
        let occurrence = Occurrence {
            range: node.byte_range(),
            shape,
        };
        let id = match self.scopes[scope].get(&name) {
            Some(existing) => {
                self.symbols[existing].declarations.push(occurrence);
                existing
            }
            None => {
                self.symbols.push(Symbol {
                    name: name.clone(),
                    kind,
                    scope,
                    declarations: vec![occurrence],
                    references: Vec::new(),
                });
                let id = self.symbols.len() - 1;
                self.scopes[scope].names.insert(name, id);
                id
            }
        };
        self.binding_nodes.insert(node.id());
    }

    fn bind_pattern(&mut self, scope: ScopeId, pattern: Node<'_>, source: &str, kind: BindingKind) {
        for (node, shape) in pattern_bindings(pattern) {
            self.bind(scope, node, source, kind, shape);
        }
    }

    fn bind_parameters(&mut self, scope: ScopeId, function: Node<'_>, source: &str) {
        if let Some(single) = function.child_by_field_name("parameter") {
            self.bind_pattern(scope, single, source, BindingKind::Param);
        }
        if let Some(params) = function.child_by_field_name("parameters") {
            for param in named_children(params) {
                self.bind_pattern(scope, param, source, BindingKind::Param);
            }
        }
    }

    fn declare(&mut self, node: Node<'_>, outer: ScopeId, source: &str) {
        if node.is_error() {
            return;
        }
        let scope = match Self::scope_kind_for(node) {
            Some(kind) => {
                let id = self.push_scope(kind, Some(outer), node.byte_range());
                self.node_scopes.insert(node.id(), id);
                id
            }
            None => outer,
        };

        match named_kind(node) {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(outer, name, source, BindingKind::Function, Shape::Plain);
                }
                self.bind_parameters(scope, node, source);
            }
            "function_expression" | "function" | "generator_function" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(scope, name, source, BindingKind::Function, Shape::Plain);
                }
                self.bind_parameters(scope, node, source);
            }
            "arrow_function" | "method_definition" => self.bind_parameters(scope, node, source),
            "class_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(outer, name, source, BindingKind::Class, Shape::Plain);
                }
            }
            "class" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.bind(scope, name, source, BindingKind::Class, Shape::Plain);
                }
            }
            "variable_declaration" => {
                let target = self.hoist_target(scope);
                for declarator in named_children(node) {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        self.bind_pattern(target, name, source, BindingKind::Var);
                    }
                }
            }
            "lexical_declaration" => {
                let kind = match node.child_by_field_name("kind").map(|k| text(k, source)) {
                    Some("const") => BindingKind::Const,
                    _ => BindingKind::Let,
                };
                for declarator in named_children(node) {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        self.bind_pattern(scope, name, source, kind);
                    }
                }
            }
            "for_in_statement" => {
                let declared = node.child_by_field_name("kind").map(|k| text(k, source));
                if let (Some(kind), Some(left)) = (declared, node.child_by_field_name("left")) {
                    match kind {
                        "var" => {
                            let target = self.hoist_target(scope);
                            self.bind_pattern(target, left, source, BindingKind::Var);
                        }
                        "const" => self.bind_pattern(scope, left, source, BindingKind::Const),
                        _ => self.bind_pattern(scope, left, source, BindingKind::Let),
                    }
                }
            }
            "catch_clause" => {
                if let Some(param) = node.child_by_field_name("parameter") {
                    self.bind_pattern(scope, param, source, BindingKind::CatchParam);
                }
            }
            "export_statement" => {
                let tokens = children(node);
                let keyword = tokens.iter().find(|t| t.kind() == "export");
                let is_default = tokens.iter().any(|t| t.kind() == "default");
                if let (Some(keyword), Some(declaration), false) = (
                    keyword,
                    node.child_by_field_name("declaration"),
                    is_default,
                ) {
                    self.exports.push(ExportedDeclaration {
                        keyword: keyword.start_byte()..declaration.start_byte(),
                        end: node.end_byte(),
                        bindings: declared_names(declaration)
                            .into_iter()
                            .map(|n| (text(n, source).to_string(), n.byte_range()))
                            .collect(),
                    });
                }
            }
            "import_statement" => {
                for (binding, _) in import_bindings(node) {
                    self.bind(0, binding, source, BindingKind::Import, Shape::ImportBinding);
                }
                return;
            }
            _ => {}
        }

        for child in children(node) {
            self.declare(child, scope, source);
        }
    }

    fn resolve(&mut self, node: Node<'_>, outer: ScopeId, source: &str) {
        if node.is_error() {
            return;
        }
        let scope = self.node_scopes.get(&node.id()).copied().unwrap_or(outer);

        match named_kind(node) {
            "import_statement" => return,
            "export_statement" if node.child_by_field_name("source").is_some() => return,
            "export_specifier" => {
                if let Some(name) = node.child_by_field_name("name") {
                    if named_kind(name) == "identifier" {
                        let shape = if node.child_by_field_name("alias").is_some() {
                            Shape::Plain
                        } else {
                            Shape::ExportSpecifier
                        };
                        self.reference(scope, name, source, shape);
                    }
                }
                return;
            }
            "identifier" => {
                if !self.binding_nodes.contains(&node.id()) {
                    self.reference(scope, node, source, Shape::Plain);
                }
                return;
            }
            "shorthand_property_identifier" => {
                self.reference(scope, node, source, Shape::ShorthandProperty);
                return;
            }
            "shorthand_property_identifier_pattern" => {
                if !self.binding_nodes.contains(&node.id()) {
                    self.reference(scope, node, source, Shape::ShorthandPattern);
                }
                return;
            }
            _ => {}
        }

        for child in children(node) {
            self.resolve(child, scope, source);
        }
    }

    fn reference(&mut self, scope: ScopeId, node: Node<'_>, source: &str, shape: Shape) {
        let name = text(node, source);
        self.names.insert(name.to_string());
        let occurrence = Occurrence {
            range: node.byte_range(),
            shape,
        };
        match self.lookup(scope, name) {
            Some(id) => self.symbols[id].references.push(occurrence),
            None => self.free.push((name.to_string(), occurrence.range)),
        }
    }
}

/// Identifiers a declaration statement binds in its enclosing scope.
fn declared_names(declaration: Node<'_>) -> Vec<Node<'_>> {
    match named_kind(declaration) {
        "lexical_declaration" | "variable_declaration" => named_children(declaration)
            .into_iter()
            .filter_map(|declarator| declarator.child_by_field_name("name"))
            .flat_map(|pattern| pattern_bindings(pattern).into_iter().map(|(n, _)| n))
            .collect(),
        _ => declaration.child_by_field_name("name").into_iter().collect(),
    }
}

/// Identifiers bound by a declaration pattern.
pub fn pattern_bindings(pattern: Node<'_>) -> Vec<(Node<'_>, Shape)> {
    let mut out = Vec::new();
    collect_pattern(pattern, &mut out);
    out
}

fn collect_pattern<'t>(node: Node<'t>, out: &mut Vec<(Node<'t>, Shape)>) {
    match named_kind(node) {
        "identifier" => out.push((node, Shape::Plain)),
        "shorthand_property_identifier_pattern" => out.push((node, Shape::ShorthandPattern)),
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_pattern(value, out);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_pattern(left, out);
            }
        }
        "object_pattern" | "array_pattern" | "rest_pattern" => {
            for child in named_children(node) {
                collect_pattern(child, out);
            }
        }
        _ => {}
    }
}

/// Local binding identifiers introduced by an import statement, paired with
/// the imported name they bind (`None` for default and namespace imports).
pub fn import_bindings(import: Node<'_>) -> Vec<(Node<'_>, Option<Node<'_>>)> {
    let mut out = Vec::new();
    let Some(clause) = named_children(import)
        .into_iter()
        .find(|c| named_kind(*c) == "import_clause")
    else {
        return out;
    };
    for part in named_children(clause) {
        match named_kind(part) {
            "identifier" => out.push((part, None)),
            "namespace_import" => {
                if let Some(id) = named_children(part)
                    .into_iter()
                    .find(|c| named_kind(*c) == "identifier")
                {
                    out.push((id, None));
                }
            }
            "named_imports" => {
                for spec in named_children(part) {
                    if named_kind(spec) != "import_specifier" {
                        continue;
                    }
                    let name = spec.child_by_field_name("name");
                    match spec.child_by_field_name("alias") {
                        Some(alias) => out.push((alias, name)),
                        None => {
                            if let Some(name) = name.filter(|n| named_kind(*n) == "identifier") {
                                out.push((name, Some(name)));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    out
}
