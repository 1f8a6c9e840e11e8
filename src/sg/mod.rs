//! ast-grep integration for pattern-based JavaScript matching.
//!
//! Pattern matching uses ast-grep's metavariable syntax (`$NAME`, `$$$ARGS`)
//! for structural search. Matches are turned into verified [`Edit`]s through
//! [`Replacement`].
//!
//! [`Edit`]: crate::edit::Edit

pub mod errors;
pub mod lang;
pub mod matcher;
pub mod replacer;

pub use errors::AstGrepError;
pub use lang::{javascript, SupportLang};
pub use matcher::{PatternMatch, PatternMatcher};
pub use replacer::{find_and_replace, Replacement};
