//! Bundle Patcher: recover the JavaScript bundled into a standalone
//! executable and rewrite it with configuration-driven syntax-tree patches.
//!
//! # Architecture
//!
//! - [`extract`] strips the bundler's framing markers from the binary.
//! - [`js`] parses the recovered source with tree-sitter and compiles every
//!   rewrite (import normalization, renames, removals, body replacement,
//!   top-level await relocation) into verified byte-span [`Edit`]s.
//! - [`pipeline`] checks the release channel, downloads, extracts,
//!   transforms and installs a runnable package.
//!
//! # Example
//!
//! ```no_run
//! use bundle_patcher::config::load_from_str;
//! use bundle_patcher::js::transform_source;
//!
//! let config = load_from_str(
//!     r#"
//! [rules]
//! remove_function_calls = ["checkForUpdates"]
//! "#,
//! )?;
//! let patched = transform_source("import fs from \"fs\";\ncheckForUpdates();\n", &config)?;
//! assert!(patched.contains("const fs = require(\"fs\");"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod config;
pub mod edit;
pub mod extract;
pub mod js;
pub mod pipeline;
pub mod pool;
pub mod safety;
pub mod sg;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, PatchConfig, RewriteRules};
pub use edit::{Edit, EditError, EditSet, EditVerification};
pub use extract::{extract, Extraction, MarkerOutcome, Signature};
pub use js::{transform, transform_source, TransformError, TransformReport, Transformed, Transformer};
pub use pipeline::{Pipeline, PipelineError, PipelineSettings, RunOutcome};
pub use safety::{OutputGuard, SafetyError};
