//! JavaScript language support via ast-grep-language.
//!
//! The built-in `SupportLang::JavaScript` carries the tree-sitter grammar and
//! the metavariable handling, so both the pattern matcher and the raw
//! tree-sitter parser share one grammar version.

pub use ast_grep_language::SupportLang;

/// Get the JavaScript language for ast-grep operations.
pub fn javascript() -> SupportLang {
    SupportLang::JavaScript
}
