//! Small helpers over tree-sitter nodes.

use tree_sitter::Node;

/// All children, named and anonymous.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Named children only.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Kind of a named node; anonymous tokens (`function`, `class`, ...) share
/// their spelling with named kinds, so they report an empty kind.
pub fn named_kind<'t>(node: Node<'t>) -> &'static str {
    if node.is_named() {
        node.kind()
    } else {
        ""
    }
}

pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Function expressions of every flavor, including arrows.
pub fn is_function_value(node: Node<'_>) -> bool {
    matches!(
        named_kind(node),
        "function_expression" | "function" | "generator_function" | "arrow_function"
    )
}

/// Nodes that open a function scope.
pub fn is_function_like(node: Node<'_>) -> bool {
    matches!(
        named_kind(node),
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function"
            | "method_definition"
    )
}

/// Strip one level of parentheses around an expression.
pub fn unparenthesize(node: Node<'_>) -> Node<'_> {
    if named_kind(node) == "parenthesized_expression" {
        if let Some(inner) = named_children(node)
            .into_iter()
            .find(|c| named_kind(*c) != "comment")
        {
            return inner;
        }
    }
    node
}

/// Name of an object key or class member: identifiers as written, string
/// keys without quotes, private names without `#`.
pub fn property_name(node: Node<'_>, source: &str) -> Option<String> {
    let raw = text(node, source);
    match named_kind(node) {
        "property_identifier" | "identifier" => Some(raw.to_string()),
        "private_property_identifier" => Some(raw.trim_start_matches('#').to_string()),
        "string" if raw.len() >= 2 => Some(raw[1..raw.len() - 1].to_string()),
        _ => None,
    }
}

/// Whether a statement node sits directly in a statement list, where it can
/// be deleted outright. Elsewhere (`if (x) stmt;`, a `for` initializer) it
/// must leave an empty statement behind.
pub fn in_statement_list(node: Node<'_>) -> bool {
    matches!(
        node.parent().map(named_kind),
        Some("program" | "statement_block" | "switch_case" | "switch_default")
    )
}
