//! `import.meta` property rewrites for CommonJS.

use crate::edit::Edit;
use crate::sg::{find_and_replace, AstGrepError, PatternMatcher, Replacement};
use std::ops::Range;

/// `import.meta` properties and their CommonJS equivalents.
pub const META_REWRITES: &[(&str, &str)] = &[
    ("import.meta.require", "require"),
    (
        "import.meta.url",
        "require(\"url\").pathToFileURL(__filename).href",
    ),
    ("import.meta.filename", "__filename"),
    ("import.meta.dirname", "__dirname"),
];

/// Edits for every known `import.meta` property outside `protected`.
pub fn meta_edits(source: &str, protected: &Range<usize>) -> Result<Vec<Edit>, AstGrepError> {
    if !source.contains("import.meta") {
        return Ok(Vec::new());
    }
    let matcher = PatternMatcher::new(source);
    let mut edits = Vec::new();
    for (pattern, replacement) in META_REWRITES {
        edits.extend(
            find_and_replace(&matcher, pattern, replacement)?
                .iter()
                .filter(|r| r.byte_start >= protected.end || r.byte_end <= protected.start)
                .map(Replacement::to_edit),
        );
    }
    Ok(edits)
}
