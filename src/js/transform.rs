//! The transformation pass: bootstrap, module normalization, configured
//! rewrites and top-level await relocation over one parsed document.

use crate::config::PatchConfig;
use crate::edit::{Edit, EditSet};
use crate::js::bootstrap::{Bootstrap, Prepared};
use crate::js::errors::TransformError;
use crate::js::imports::{ImportShape, TempNames};
use crate::js::meta::meta_edits;
use crate::js::node::{children, named_children, named_kind};
use crate::js::parser::ParsedSource;
use crate::js::rename::rename_edits;
use crate::js::report::{suggest, TransformReport, UnmatchedName};
use crate::js::rules::{
    line_extent, RuleEngine, REMOVE_FUNCTION_CALLS, REMOVE_IDENTIFIERS, RENAME_IDENTIFIERS,
    REPLACE_FUNCTION_BODY,
};
use crate::js::scope::ScopeTree;
use crate::js::suspension::{code_end, top_level_awaits, wrapper, Relocated};
use crate::js::validator::validate_output;
use crate::pool::with_parser;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};
use tree_sitter::Node;

/// Output of a transform pass.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub code: String,
    pub report: TransformReport,
}

#[derive(Debug, Clone, Default)]
pub struct Transformer {
    bootstrap: Bootstrap,
}

impl Transformer {
    pub fn new(bootstrap: Bootstrap) -> Self {
        Self { bootstrap }
    }

    /// Rewrite `source` according to `config`.
    ///
    /// Comments and formatting outside rewritten spans are preserved
    /// byte-for-byte. Fails when the source has no parseable code at all,
    /// when two rewrites conflict, or when the result has more syntax errors
    /// than the input.
    pub fn transform(&self, source: &str, config: &PatchConfig) -> Result<Transformed, TransformError> {
        let prepared = self.bootstrap.prepend(source);
        let text = prepared.text.as_str();
        let tree = with_parser(|parser| parser.parse(text))??;
        let parsed = ParsedSource { source: text, tree };
        let root = parsed.root_node();

        check_parseable(root, &prepared)?;
        let input_errors = parsed.error_nodes();
        let user_errors: Vec<_> = input_errors
            .iter()
            .filter(|e| e.byte_start >= prepared.user_start())
            .collect();
        if let Some(first) = user_errors.first() {
            warn!(
                count = user_errors.len(),
                line = first.start_point.row + 1,
                column = first.start_point.column + 1,
                "tolerating syntax errors; affected regions are left as-is"
            );
        }

        let scopes = ScopeTree::build(root, text);
        let rules = &config.rules;
        let mut report = TransformReport {
            parse_errors: user_errors.len(),
            ..TransformReport::default()
        };
        let mut edits = EditSet::new();

        let mut temp = TempNames::new(&scopes);
        for new in rules.rename_identifiers.values() {
            temp.reserve(new.clone());
        }
        for stmt in named_children(root) {
            if named_kind(stmt) != "import_statement" || prepared.is_protected(&stmt.byte_range()) {
                continue;
            }
            let Some(shape) = ImportShape::from_node(stmt, text) else {
                continue;
            };
            let replacement = shape.renamed(&rules.rename_identifiers).to_require(&mut temp);
            edits.push(Edit::new(text, stmt.start_byte(), stmt.end_byte(), replacement));
            report.imports_converted += 1;
        }

        let meta = meta_edits(text, &prepared.protected)?;
        report.meta_rewritten = meta.len();
        edits.extend(meta);

        let renamed = rename_edits(&scopes, text, &rules.rename_identifiers, &prepared.protected);
        report.bindings_renamed = renamed.bindings;
        edits.extend(renamed.edits);

        let outcome = RuleEngine::new(text, rules, prepared.protected.clone()).run(root);
        report.identifiers_removed = outcome.identifiers_removed;
        report.calls_removed = outcome.calls_removed;
        report.bodies_replaced = outcome.bodies_replaced;
        edits.extend(outcome.edits);

        // Render relocated statements before their deletions join the set
        let mut relocated = Vec::new();
        let mut deletions = Vec::new();
        for stmt in top_level_awaits(root) {
            let range = stmt.byte_range();
            let already_rewritten = edits
                .iter()
                .any(|e| e.byte_start <= range.start && e.byte_end >= range.end);
            if prepared.is_protected(&range) || already_rewritten {
                continue;
            }
            let end = code_end(stmt);
            relocated.push(Relocated {
                code: edits.render(text, range.start..end)?,
                comment: text[end..range.end].to_string(),
            });
            let range = line_extent(text, range);
            deletions.push(Edit::new(text, range.start, range.end, ""));
        }
        report.awaits_relocated = relocated.len();
        edits.extend(deletions);

        let mut code = edits.apply(text)?;
        if !relocated.is_empty() {
            code.push_str(&wrapper(&relocated));
        }
        validate_output(&code, input_errors.len())?;

        let mut hits = outcome.hits;
        hits.extend(
            renamed
                .matched
                .into_iter()
                .map(|name| (RENAME_IDENTIFIERS, name)),
        );
        let candidates: BTreeSet<&str> = scopes
            .identifier_names()
            .chain(outcome.property_names.iter().map(String::as_str))
            .collect();
        report.unmatched = unmatched_names(config, &hits, &candidates);
        for unmatched in &report.unmatched {
            warn!("{unmatched}");
        }

        debug!(
            rewrites = report.total_rewrites(),
            edits = edits.len(),
            "transform complete"
        );
        Ok(Transformed { code, report })
    }
}

/// Transform with the default bootstrap.
pub fn transform(source: &str, config: &PatchConfig) -> Result<Transformed, TransformError> {
    Transformer::default().transform(source, config)
}

/// Transform with the default bootstrap and return only the code.
pub fn transform_source(source: &str, config: &PatchConfig) -> Result<String, TransformError> {
    transform(source, config).map(|t| t.code)
}

/// The document is unusable when nothing after the bootstrap parsed.
fn check_parseable(root: Node<'_>, prepared: &Prepared) -> Result<(), TransformError> {
    if root.is_error() {
        return Err(TransformError::Unparseable {
            reason: "the document root is a syntax error".to_string(),
        });
    }
    let user: Vec<Node<'_>> = children(root)
        .into_iter()
        .filter(|c| c.end_byte() > prepared.user_start())
        .filter(|c| !matches!(named_kind(*c), "comment" | "hash_bang_line"))
        .collect();
    if !user.is_empty() && user.iter().all(|c| c.is_error()) {
        return Err(TransformError::Unparseable {
            reason: format!(
                "no statement after byte {} could be parsed",
                prepared.user_start()
            ),
        });
    }
    Ok(())
}

fn unmatched_names(
    config: &PatchConfig,
    hits: &HashSet<(&'static str, String)>,
    candidates: &BTreeSet<&str>,
) -> Vec<UnmatchedName> {
    let rules = &config.rules;
    let configured = rules
        .remove_identifiers
        .iter()
        .map(|n| (REMOVE_IDENTIFIERS, n))
        .chain(rules.rename_identifiers.keys().map(|n| (RENAME_IDENTIFIERS, n)))
        .chain(rules.remove_function_calls.iter().map(|n| (REMOVE_FUNCTION_CALLS, n)))
        .chain(rules.replace_function_body.keys().map(|n| (REPLACE_FUNCTION_BODY, n)));

    configured
        .filter(|(rule, name)| !hits.contains(&(*rule, (*name).clone())))
        .map(|(rule, name)| UnmatchedName {
            rule,
            name: name.clone(),
            suggestion: suggest(name, candidates.iter().copied()),
        })
        .collect()
}
