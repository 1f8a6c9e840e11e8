use crate::cache;
use crate::sg::errors::AstGrepError;
use crate::sg::lang::javascript;
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch};
use ast_grep_language::SupportLang;

/// One structural match in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    /// The matched text, kept for edit verification.
    pub text: String,
}

/// Structural search over one JavaScript document.
///
/// Patterns are written as JavaScript with ast-grep metavariables: `$NAME`
/// matches one node, `$$$ARGS` zero or more. `import.meta.url` matches the
/// member chain wherever it appears as an expression, but not inside strings
/// or comments.
pub struct PatternMatcher {
    source: String,
    sg: AstGrep<StrDoc<SupportLang>>,
}

impl PatternMatcher {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            sg: AstGrep::new(source, javascript()),
        }
    }

    /// Every match of `pattern`, in source order.
    pub fn find_all(&self, pattern: &str) -> Result<Vec<PatternMatch>, AstGrepError> {
        if pattern.trim().is_empty() {
            return Err(AstGrepError::InvalidPattern {
                message: "pattern is empty".to_string(),
            });
        }
        let compiled = cache::get_or_compile_pattern(pattern, javascript());
        let mut results: Vec<_> = self
            .sg
            .root()
            .find_all(&compiled)
            .map(|m| self.to_match(m))
            .collect();
        results.sort_by_key(|m| (m.byte_start, m.byte_end));
        Ok(results)
    }

    fn to_match(&self, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
        let range = m.get_node().range();
        PatternMatch {
            byte_start: range.start,
            byte_end: range.end,
            text: self.source[range].to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_calls_in_source_order() {
        let source = "track(\"start\");\nfunction run() {\n  track(\"inner\");\n  other();\n}\n";
        let matches = PatternMatcher::new(source).find_all("track($ARG)").unwrap();
        let texts: Vec<_> = matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["track(\"start\")", "track(\"inner\")"]);
        assert!(matches[0].byte_end <= matches[1].byte_start);
    }

    #[test]
    fn meta_property_outside_strings_only() {
        let source = "const u = import.meta.url;\nconst s = \"import.meta.url\";\n// import.meta.url\n";
        let matches = PatternMatcher::new(source).find_all("import.meta.url").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(&source[matches[0].byte_start..matches[0].byte_end], "import.meta.url");
    }

    #[test]
    fn empty_pattern_is_invalid() {
        let matcher = PatternMatcher::new("f();");
        assert!(matches!(
            matcher.find_all("  "),
            Err(AstGrepError::InvalidPattern { .. })
        ));
    }
}
