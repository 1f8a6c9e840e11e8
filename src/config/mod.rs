pub mod loader;
pub mod schema;
pub mod version;

pub use loader::{
    default_config, load_from_json_str, load_from_path, load_from_str, ConfigError,
    DEFAULT_PATCHES,
};
pub use schema::{
    is_identifier, Metadata, PatchConfig, RewriteRules, ValidationError, ValidationIssue,
};
pub use version::{is_newer, parse_version, versions_equal, VersionError};
