//! Top-level `await` relocation.
//!
//! CommonJS modules cannot suspend at the top level, so program-level
//! `await` statements move into one async wrapper appended to the program.

use crate::js::node::{children, named_children, named_kind, unparenthesize};
use tree_sitter::Node;

/// Program-level expression statements whose expression is an `await`.
pub fn top_level_awaits(program: Node<'_>) -> Vec<Node<'_>> {
    named_children(program)
        .into_iter()
        .filter(|stmt| named_kind(*stmt) == "expression_statement")
        .filter(|stmt| {
            stmt.named_child(0)
                .map(unparenthesize)
                .is_some_and(|expr| named_kind(expr) == "await_expression")
        })
        .collect()
}

/// End of `stmt` without the comments trailing its code.
///
/// A statement ended by automatic semicolon insertion can absorb a comment
/// on the same line.
pub fn code_end(stmt: Node<'_>) -> usize {
    children(stmt)
        .into_iter()
        .rev()
        .find(|child| child.kind() != "comment" && child.start_byte() < child.end_byte())
        .map_or(stmt.end_byte(), |child| child.end_byte())
}

/// A statement moving into the async wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    pub code: String,
    /// Comments that trailed the code on its line.
    pub comment: String,
}

/// The trailing async wrapper around relocated statements, in order.
pub fn wrapper(statements: &[Relocated]) -> String {
    let mut out = String::from("\n;(async () => {\n");
    for stmt in statements {
        let code = stmt.code.trim();
        out.push_str("  ");
        out.push_str(code);
        if !code.ends_with(';') {
            out.push(';');
        }
        let comment = stmt.comment.trim();
        if !comment.is_empty() {
            out.push(' ');
            out.push_str(comment);
        }
        out.push('\n');
    }
    out.push_str("})();\n");
    out
}
