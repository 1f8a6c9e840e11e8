use crate::edit::{Edit, EditVerification};
use crate::sg::errors::AstGrepError;
use crate::sg::matcher::{PatternMatch, PatternMatcher};

/// A replacement of one pattern match with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Byte range to replace
    pub byte_start: usize,
    pub byte_end: usize,
    /// Original text (for verification)
    pub original: String,
    /// New text
    pub replacement: String,
}

impl Replacement {
    /// Replace the entire matched region with new text.
    pub fn for_match(m: &PatternMatch, new_text: impl Into<String>) -> Self {
        Self {
            byte_start: m.byte_start,
            byte_end: m.byte_end,
            original: m.text.clone(),
            replacement: new_text.into(),
        }
    }

    /// Convert to a verified edit.
    pub fn to_edit(&self) -> Edit {
        Edit::with_verification(
            self.byte_start,
            self.byte_end,
            self.replacement.clone(),
            EditVerification::from_text(&self.original),
        )
    }
}

/// Find every match of `pattern` and replace it with `replacement`.
///
/// Matches nested inside another match are dropped so the result never
/// contains overlapping spans.
pub fn find_and_replace(
    matcher: &PatternMatcher,
    pattern: &str,
    replacement: &str,
) -> Result<Vec<Replacement>, AstGrepError> {
    let mut out: Vec<Replacement> = Vec::new();
    for m in matcher.find_all(pattern)? {
        if let Some(prev) = out.last() {
            if m.byte_start < prev.byte_end {
                continue;
            }
        }
        out.push(Replacement::for_match(&m, replacement));
    }
    Ok(out)
}
