use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A rewrite rule set: what the transformer should rename, remove and
/// replace. Every rule is optional and independent; an empty config still
/// runs the config-independent steps (bootstrap injection, module syntax
/// normalization, top-level await relocation).
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: RewriteRules,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// The four declarative rewrite rules.
///
/// Field names accept both the TOML snake_case spelling and the camelCase
/// spelling used by JSON configs.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RewriteRules {
    /// Function declarations and variable declarators to delete.
    #[serde(default, alias = "removeIdentifiers")]
    pub remove_identifiers: BTreeSet<String>,
    /// Bindings to rename, together with every reference to them.
    #[serde(default, alias = "renameIdentifiers")]
    pub rename_identifiers: BTreeMap<String, String>,
    /// Calls to delete (by callee name or member property name).
    #[serde(default, alias = "removeFunctionCalls")]
    pub remove_function_calls: BTreeSet<String>,
    /// Functions and methods whose body becomes `return "<literal>";`.
    #[serde(default, alias = "replaceFunctionBody")]
    pub replace_function_body: BTreeMap<String, String>,
}

impl RewriteRules {
    pub fn is_empty(&self) -> bool {
        self.remove_identifiers.is_empty()
            && self.rename_identifiers.is_empty()
            && self.remove_function_calls.is_empty()
            && self.replace_function_body.is_empty()
    }
}

impl PatchConfig {
    pub fn from_rules(rules: RewriteRules) -> Self {
        Self {
            meta: Metadata::default(),
            rules,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let rules = &self.rules;

        let names = rules
            .remove_identifiers
            .iter()
            .map(|n| ("remove_identifiers", n))
            .chain(rules.rename_identifiers.keys().map(|n| ("rename_identifiers", n)))
            .chain(rules.remove_function_calls.iter().map(|n| ("remove_function_calls", n)))
            .chain(rules.replace_function_body.keys().map(|n| ("replace_function_body", n)));

        for (rule, name) in names {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::EmptyName { rule });
            } else if !is_identifier(name) {
                issues.push(ValidationIssue::InvalidIdentifier {
                    rule,
                    name: name.clone(),
                });
            }
        }

        for (from, to) in &rules.rename_identifiers {
            if from == to {
                issues.push(ValidationIssue::RenameToSelf { name: from.clone() });
            } else if !is_identifier(to) {
                issues.push(ValidationIssue::InvalidIdentifier {
                    rule: "rename_identifiers",
                    name: to.clone(),
                });
            } else if RESERVED_WORDS.contains(&to.as_str()) {
                issues.push(ValidationIssue::ReservedWord { name: to.clone() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "static", "super",
    "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Whether `name` is spelled like a JavaScript identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyName { rule: &'static str },
    InvalidIdentifier { rule: &'static str, name: String },
    RenameToSelf { name: String },
    ReservedWord { name: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyName { rule } => write!(f, "{rule} contains an empty name"),
            ValidationIssue::InvalidIdentifier { rule, name } => {
                write!(f, "{rule} entry '{name}' is not a valid identifier")
            }
            ValidationIssue::RenameToSelf { name } => {
                write!(f, "rename_identifiers maps '{name}' to itself")
            }
            ValidationIssue::ReservedWord { name } => {
                write!(f, "rename_identifiers target '{name}' is a reserved word")
            }
        }
    }
}
