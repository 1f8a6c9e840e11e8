use crate::edit::EditError;
use crate::sg::AstGrepError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("source could not be parsed: {reason}")]
    Unparseable { reason: String },

    #[error("rewrite introduced {count} new syntax error(s), first at byte {first_byte}")]
    IntroducedSyntaxErrors { count: usize, first_byte: usize },

    #[error("failed to compose rewrites: {0}")]
    Edit(#[from] EditError),

    #[error("pattern query failed: {0}")]
    Pattern(#[from] AstGrepError),
}
