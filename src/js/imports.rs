//! ES module import statements to CommonJS `require` forms.

use crate::js::node::{named_children, named_kind, text};
use crate::js::scope::ScopeTree;
use std::collections::{BTreeMap, HashSet};
use tree_sitter::Node;

/// The bindings an import statement introduces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportShape {
    /// The module specifier literal as written, quotes included.
    pub module: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    /// `(imported, local)` pairs; `imported` is an identifier or a string
    /// literal.
    pub named: Vec<(String, String)>,
}

impl ImportShape {
    /// Read an `import_statement` node. Returns `None` for malformed imports
    /// without a module specifier.
    pub fn from_node(import: Node<'_>, source: &str) -> Option<Self> {
        let module = import.child_by_field_name("source")?;
        let mut shape = ImportShape {
            module: text(module, source).to_string(),
            ..ImportShape::default()
        };

        let Some(clause) = named_children(import)
            .into_iter()
            .find(|c| named_kind(*c) == "import_clause")
        else {
            return Some(shape);
        };

        for part in named_children(clause) {
            match named_kind(part) {
                "identifier" => shape.default = Some(text(part, source).to_string()),
                "namespace_import" => {
                    shape.namespace = named_children(part)
                        .into_iter()
                        .find(|c| named_kind(*c) == "identifier")
                        .map(|id| text(id, source).to_string());
                }
                "named_imports" => {
                    for spec in named_children(part) {
                        if named_kind(spec) != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = text(name, source).to_string();
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|alias| text(alias, source).to_string())
                            .unwrap_or_else(|| imported.clone());
                        shape.named.push((imported, local));
                    }
                }
                _ => {}
            }
        }
        Some(shape)
    }

    /// Apply a rename map to the local bindings.
    pub fn renamed(mut self, renames: &BTreeMap<String, String>) -> Self {
        let rename = |name: &mut String| {
            if let Some(new) = renames.get(name.as_str()) {
                *name = new.clone();
            }
        };
        if let Some(d) = self.default.as_mut() {
            rename(d);
        }
        if let Some(n) = self.namespace.as_mut() {
            rename(n);
        }
        for (_, local) in &mut self.named {
            rename(local);
        }
        self
    }

    fn destructure(&self) -> String {
        let fields: Vec<String> = self
            .named
            .iter()
            .map(|(imported, local)| {
                if imported == local {
                    local.clone()
                } else {
                    format!("{imported}: {local}")
                }
            })
            .collect();
        format!("{{ {} }}", fields.join(", "))
    }

    /// Render the CommonJS replacement. `temp` supplies a fresh identifier
    /// when one module object must feed several bindings.
    pub fn to_require(&self, temp: &mut TempNames) -> String {
        let require = format!("require({})", self.module);
        let bindings = [self.default.is_some(), self.namespace.is_some(), !self.named.is_empty()]
            .iter()
            .filter(|b| **b)
            .count();

        if bindings == 0 {
            return format!("{require};");
        }
        if bindings == 1 {
            let target = match (&self.default, &self.namespace) {
                (Some(d), _) => d.clone(),
                (_, Some(n)) => n.clone(),
                _ => self.destructure(),
            };
            return format!("const {target} = {require};");
        }

        let tmp = temp.next();
        let mut parts = vec![format!("const {tmp} = {require};")];
        if let Some(d) = &self.default {
            parts.push(format!("const {d} = {tmp};"));
        }
        if let Some(n) = &self.namespace {
            parts.push(format!("const {n} = {tmp};"));
        }
        if !self.named.is_empty() {
            parts.push(format!("const {} = {tmp};", self.destructure()));
        }
        parts.join(" ")
    }
}

/// Generator of temporary identifiers that never collide with any
/// identifier spelled in the program.
pub struct TempNames<'a> {
    scopes: &'a ScopeTree,
    reserved: HashSet<String>,
    issued: usize,
}

impl<'a> TempNames<'a> {
    pub fn new(scopes: &'a ScopeTree) -> Self {
        Self {
            scopes,
            reserved: HashSet::new(),
            issued: 0,
        }
    }

    /// Treat `name` as taken, e.g. the target of a rename.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.reserved.insert(name.into());
    }

    pub fn next(&mut self) -> String {
        loop {
            self.issued += 1;
            let candidate = if self.issued == 1 {
                "_imported".to_string()
            } else {
                format!("_imported{}", self.issued)
            };
            if !self.scopes.mentions(&candidate) && !self.reserved.contains(&candidate) {
                self.reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }
}
