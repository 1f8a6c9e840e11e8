//! JavaScript source transformation over tree-sitter syntax trees.
//!
//! A transform pass prepends the credential [`Bootstrap`], parses the
//! result once, and compiles every rewrite into byte-span edits:
//!
//! - `import` statements become `require` forms ([`imports`]), and
//!   `import.meta` properties their CommonJS equivalents ([`meta`])
//! - configured renames follow the [`ScopeTree`] ([`rename`])
//! - configured removals and body replacements walk the tree ([`rules`])
//! - program-level `await` statements move into a trailing async wrapper
//!   ([`suspension`])
//!
//! The rendered output is re-parsed and rejected if it gained syntax errors.

pub mod bootstrap;
pub mod errors;
pub mod imports;
pub mod meta;
pub mod node;
pub mod parser;
pub mod rename;
pub mod report;
pub mod rules;
pub mod scope;
pub mod suspension;
pub mod transform;
pub mod validator;

pub use bootstrap::{Bootstrap, Prepared};
pub use errors::TransformError;
pub use parser::{ErrorNode, JsParser, ParsedSource};
pub use report::{TransformReport, UnmatchedName};
pub use scope::ScopeTree;
pub use transform::{transform, transform_source, Transformed, Transformer};
pub use validator::{syntax_errors, validate_output};
