//! Scope-aware identifier renaming.

use crate::edit::Edit;
use crate::js::scope::{Shape, ScopeTree};
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

#[derive(Debug, Default)]
pub struct RenameOutcome {
    pub edits: Vec<Edit>,
    /// Bindings renamed (one per symbol, however many occurrences it has).
    pub bindings: usize,
    pub matched: HashSet<String>,
}

/// Edits renaming every binding named by a key of `renames` together with
/// all references the scope table resolves to it.
///
/// Import bindings produce no edit here: their statement is rewritten as a
/// whole and picks up the new name there. A renamed binding of an
/// `export <declaration>` keeps its exported name: the `export` keyword moves
/// into an `export { renamed as name }` list after the declaration.
pub fn rename_edits(
    scopes: &ScopeTree,
    source: &str,
    renames: &BTreeMap<String, String>,
    protected: &Range<usize>,
) -> RenameOutcome {
    let touches = |r: &Range<usize>| r.start < protected.end && r.end > protected.start;
    let mut out = RenameOutcome::default();

    for (old, new) in renames {
        for id in scopes.symbols_named(old) {
            let symbol = scopes.symbol(id);
            if symbol.declarations.iter().any(|d| touches(&d.range)) {
                continue;
            }
            out.bindings += 1;
            out.matched.insert(old.clone());

            for occurrence in symbol.occurrences() {
                if touches(&occurrence.range) {
                    continue;
                }
                let replacement = match occurrence.shape {
                    Shape::Plain => new.clone(),
                    Shape::ShorthandProperty | Shape::ShorthandPattern => format!("{old}: {new}"),
                    Shape::ExportSpecifier => format!("{new} as {old}"),
                    Shape::ImportBinding => continue,
                };
                out.edits.push(Edit::new(
                    source,
                    occurrence.range.start,
                    occurrence.range.end,
                    replacement,
                ));
            }
        }
    }

    for export in scopes.exported_declarations() {
        if touches(&export.keyword) {
            continue;
        }
        let renamed: Vec<_> = export
            .bindings
            .iter()
            .map(|(name, range)| renames.get(name).filter(|_| !touches(range)))
            .collect();
        if renamed.iter().all(Option::is_none) {
            continue;
        }
        let specifiers: Vec<String> = export
            .bindings
            .iter()
            .zip(&renamed)
            .map(|((name, _), new)| match new {
                Some(new) => format!("{new} as {name}"),
                None => name.clone(),
            })
            .collect();
        out.edits.push(Edit::new(source, export.keyword.start, export.keyword.end, ""));
        out.edits.push(Edit::new(
            source,
            export.end,
            export.end,
            format!("\nexport {{ {} }};", specifiers.join(", ")),
        ));
    }
    out
}
