//! The configured rewrite rules that walk the tree: declaration removal,
//! call removal and function body replacement.
//!
//! Each rule turns matching nodes into [`Edit`]s. The walk does not descend
//! into a node it has already rewritten as a whole; edits nested in a
//! rewritten span would be subsumed anyway.

use crate::config::RewriteRules;
use crate::edit::Edit;
use crate::js::node::{
    children, in_statement_list, is_function_value, named_children, named_kind, property_name,
    text, unparenthesize,
};
use std::collections::HashSet;
use std::ops::Range;
use tree_sitter::Node;

pub const REMOVE_IDENTIFIERS: &str = "remove_identifiers";
pub const RENAME_IDENTIFIERS: &str = "rename_identifiers";
pub const REMOVE_FUNCTION_CALLS: &str = "remove_function_calls";
pub const REPLACE_FUNCTION_BODY: &str = "replace_function_body";

/// Edits and bookkeeping produced by one walk.
#[derive(Debug, Default)]
pub struct RuleOutcome {
    pub edits: Vec<Edit>,
    pub identifiers_removed: usize,
    pub calls_removed: usize,
    pub bodies_replaced: usize,
    /// `(rule, name)` pairs that matched at least once.
    pub hits: HashSet<(&'static str, String)>,
    /// Member and key names seen during the walk, for suggestions.
    pub property_names: HashSet<String>,
}

pub struct RuleEngine<'a> {
    source: &'a str,
    rules: &'a RewriteRules,
    protected: Range<usize>,
    out: RuleOutcome,
}

impl<'a> RuleEngine<'a> {
    pub fn new(source: &'a str, rules: &'a RewriteRules, protected: Range<usize>) -> Self {
        Self {
            source,
            rules,
            protected,
            out: RuleOutcome::default(),
        }
    }

    pub fn run(mut self, root: Node<'_>) -> RuleOutcome {
        self.visit(root);
        self.out
    }

    fn touches_protected(&self, range: &Range<usize>) -> bool {
        range.start < self.protected.end && range.end > self.protected.start
    }

    fn inside_protected(&self, node: Node<'_>) -> bool {
        !self.protected.is_empty()
            && node.start_byte() >= self.protected.start
            && node.end_byte() <= self.protected.end
    }

    fn push(&mut self, range: Range<usize>, new_text: impl Into<String>) -> bool {
        if self.touches_protected(&range) {
            return false;
        }
        self.out
            .edits
            .push(Edit::new(self.source, range.start, range.end, new_text));
        true
    }

    fn hit(&mut self, rule: &'static str, name: &str) {
        self.out.hits.insert((rule, name.to_string()));
    }

    fn visit(&mut self, node: Node<'_>) {
        if node.is_error() || self.inside_protected(node) {
            return;
        }
        let rules = self.rules;
        let source = self.source;

        match named_kind(node) {
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name").map(|n| text(n, source)) {
                    if rules.remove_identifiers.contains(name) {
                        if self.remove_statement(export_wrapper(node)) {
                            self.hit(REMOVE_IDENTIFIERS, name);
                            self.out.identifiers_removed += 1;
                        }
                        return;
                    }
                    if let Some(literal) = rules.replace_function_body.get(name) {
                        self.replace_body(node, name, literal);
                        return;
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                if self.remove_declarators(node) {
                    return;
                }
            }
            "variable_declarator" => {
                let name = node
                    .child_by_field_name("name")
                    .filter(|n| named_kind(*n) == "identifier")
                    .map(|n| text(n, source));
                let value = node.child_by_field_name("value").map(unparenthesize);
                if let (Some(name), Some(value)) = (name, value) {
                    if let Some(literal) = rules.replace_function_body.get(name) {
                        if is_function_value(value) {
                            self.replace_body(value, name, literal);
                            return;
                        }
                    }
                }
            }
            "call_expression" => {
                if let Some(name) = callee_name(node, source) {
                    if rules.remove_function_calls.contains(&name) {
                        self.remove_call(node, &name);
                        return;
                    }
                }
            }
            "method_definition" => {
                let name = node
                    .child_by_field_name("name")
                    .and_then(|n| property_name(n, source));
                if let Some(name) = name {
                    if let Some(literal) = rules.replace_function_body.get(&name) {
                        self.replace_body(node, &name, literal);
                        return;
                    }
                }
            }
            "pair" | "field_definition" | "public_field_definition" => {
                let key = node
                    .child_by_field_name("key")
                    .or_else(|| node.child_by_field_name("property"))
                    .and_then(|k| property_name(k, source));
                let value = node.child_by_field_name("value").map(unparenthesize);
                if let (Some(key), Some(value)) = (key, value) {
                    if let Some(literal) = rules.replace_function_body.get(&key) {
                        if is_function_value(value) {
                            self.replace_body(value, &key, literal);
                            return;
                        }
                    }
                }
            }
            "property_identifier" => {
                self.out.property_names.insert(text(node, source).to_string());
            }
            _ => {}
        }

        for child in children(node) {
            self.visit(child);
        }
    }

    /// Delete a statement, or leave `;` where the grammar needs a statement.
    fn remove_statement(&mut self, stmt: Node<'_>) -> bool {
        if in_statement_list(stmt) {
            let range = line_extent(self.source, stmt.byte_range());
            self.push(range, "")
        } else {
            self.push(stmt.byte_range(), ";")
        }
    }

    /// Remove matching declarators. Returns true when the walk must not
    /// descend into the declaration again.
    fn remove_declarators(&mut self, decl: Node<'_>) -> bool {
        let source = self.source;
        let declarators: Vec<Node<'_>> = named_children(decl)
            .into_iter()
            .filter(|d| named_kind(*d) == "variable_declarator")
            .collect();
        let names: Vec<Option<&str>> = declarators
            .iter()
            .map(|d| {
                d.child_by_field_name("name")
                    .filter(|n| named_kind(*n) == "identifier")
                    .map(|n| text(n, source))
                    .filter(|n| self.rules.remove_identifiers.contains(*n))
            })
            .collect();
        if names.iter().all(Option::is_none) {
            return false;
        }

        let Some(first_kept) = names.iter().position(Option::is_none) else {
            if self.remove_statement(export_wrapper(decl)) {
                for name in names.iter().flatten() {
                    self.hit(REMOVE_IDENTIFIERS, name);
                    self.out.identifiers_removed += 1;
                }
            }
            return true;
        };

        // Removed declarators before the first kept one take their trailing
        // comma; the ones after it take their leading comma.
        for (idx, name) in names.iter().enumerate() {
            let Some(name) = name else {
                continue;
            };
            let range = if idx < first_kept {
                declarators[idx].start_byte()..declarators[idx + 1].start_byte()
            } else {
                declarators[idx - 1].end_byte()..declarators[idx].end_byte()
            };
            if self.push(range, "") {
                self.hit(REMOVE_IDENTIFIERS, name);
                self.out.identifiers_removed += 1;
            }
        }
        for (idx, declarator) in declarators.iter().enumerate() {
            if names[idx].is_none() {
                self.visit(*declarator);
            }
        }
        true
    }

    fn remove_call(&mut self, call: Node<'_>, name: &str) {
        let removed = match call.parent() {
            Some(stmt) if named_kind(stmt) == "expression_statement" => self.remove_statement(stmt),
            Some(p)
                if matches!(
                    named_kind(p),
                    "member_expression" | "subscript_expression" | "call_expression"
                ) =>
            {
                self.push(call.byte_range(), "(void 0)")
            }
            _ => self.push(call.byte_range(), "void 0"),
        };
        if removed {
            self.hit(REMOVE_FUNCTION_CALLS, name);
            self.out.calls_removed += 1;
        }
    }

    fn replace_body(&mut self, function: Node<'_>, name: &str, literal: &str) {
        let Some(body) = function.child_by_field_name("body") else {
            return;
        };
        let literal = serde_json::Value::String(literal.to_string());
        if self.push(body.byte_range(), format!("{{ return {literal}; }}")) {
            self.hit(REPLACE_FUNCTION_BODY, name);
            self.out.bodies_replaced += 1;
        }
    }
}

/// `export function f` and `export const a` are removed with their export.
fn export_wrapper(node: Node<'_>) -> Node<'_> {
    match node.parent() {
        Some(parent) if named_kind(parent) == "export_statement" => parent,
        _ => node,
    }
}

/// Callee name of a call: the identifier, or the property of a member
/// expression.
pub fn callee_name(call: Node<'_>, source: &str) -> Option<String> {
    let callee = unparenthesize(call.child_by_field_name("function")?);
    match named_kind(callee) {
        "identifier" => Some(text(callee, source).to_string()),
        "member_expression" => callee
            .child_by_field_name("property")
            .and_then(|p| property_name(p, source)),
        _ => None,
    }
}

/// Widen a deleted statement to its whole line when nothing else shares
/// the line.
pub fn line_extent(source: &str, range: Range<usize>) -> Range<usize> {
    let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    if !source[line_start..range.start]
        .chars()
        .all(|c| c == ' ' || c == '\t')
    {
        return range;
    }
    let rest = &source[range.end..];
    let after = range.end + (rest.len() - rest.trim_start_matches([' ', '\t']).len());
    if source[after..].starts_with('\n') {
        line_start..after + 1
    } else if source[after..].starts_with("\r\n") {
        line_start..after + 2
    } else {
        range
    }
}
