use std::fmt;

/// What one transform pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    pub imports_converted: usize,
    pub meta_rewritten: usize,
    pub bindings_renamed: usize,
    pub identifiers_removed: usize,
    pub calls_removed: usize,
    pub bodies_replaced: usize,
    pub awaits_relocated: usize,
    /// Recoverable syntax errors left untouched in the input.
    pub parse_errors: usize,
    /// Configured names that matched nothing.
    pub unmatched: Vec<UnmatchedName>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedName {
    pub rule: &'static str,
    pub name: String,
    /// Closest identifier present in the source, if any is close enough.
    pub suggestion: Option<String>,
}

impl TransformReport {
    pub fn total_rewrites(&self) -> usize {
        self.imports_converted
            + self.meta_rewritten
            + self.bindings_renamed
            + self.identifiers_removed
            + self.calls_removed
            + self.bodies_replaced
            + self.awaits_relocated
    }
}

impl fmt::Display for UnmatchedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}' matched nothing", self.rule, self.name)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{suggestion}'?)")?;
        }
        Ok(())
    }
}

impl fmt::Display for TransformReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} import(s), {} meta propert(ies), {} rename(s), {} removal(s), {} call(s), {} bod(ies), {} await(s)",
            self.imports_converted,
            self.meta_rewritten,
            self.bindings_renamed,
            self.identifiers_removed,
            self.calls_removed,
            self.bodies_replaced,
            self.awaits_relocated,
        )
    }
}

/// Closest candidate to `name` by Jaro-Winkler similarity.
pub fn suggest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .filter(|c| *c != name)
        .map(|c| (strsim::jaro_winkler(name, c), c))
        .filter(|(score, _)| *score >= 0.85)
        .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(a.1)))
        .map(|(_, c)| c.to_string())
}
