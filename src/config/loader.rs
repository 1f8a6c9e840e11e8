use crate::config::schema::{PatchConfig, RewriteRules, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The rule set the pipeline applies when no config file is given.
pub const DEFAULT_PATCHES: &str = include_str!("../../patches/default.toml");

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Json { path: None, source } => ConfigError::Json {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read patch config from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse patch config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse patch config TOML: {}", source),
            },
            ConfigError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse patch config JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse patch config JSON: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid patch config ({}): {}", path.display(), source),
                None => write!(f, "invalid patch config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

/// Parse and validate a TOML patch config.
pub fn load_from_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let config: PatchConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    validated(config)
}

/// Parse and validate a JSON patch config.
///
/// Accepts either the full `{ "meta": ..., "rules": ... }` shape or a bare
/// rules object such as `{ "removeFunctionCalls": ["track"] }`.
pub fn load_from_json_str(input: &str) -> Result<PatchConfig, ConfigError> {
    let value: serde_json::Value = serde_json::from_str(input)
        .map_err(|source| ConfigError::Json { path: None, source })?;
    let full_shape = value
        .as_object()
        .is_some_and(|o| o.contains_key("rules") || o.contains_key("meta"));

    let config = if full_shape {
        serde_json::from_value::<PatchConfig>(value)
    } else {
        serde_json::from_value::<RewriteRules>(value).map(PatchConfig::from_rules)
    }
    .map_err(|source| ConfigError::Json { path: None, source })?;
    validated(config)
}

/// Load a patch config file; `.json` files are parsed as JSON, everything
/// else as TOML.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatchConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        load_from_json_str(&contents)
    } else {
        load_from_str(&contents)
    };
    parsed.map_err(|error| error.with_path(path))
}

/// The bundled default rule set.
pub fn default_config() -> Result<PatchConfig, ConfigError> {
    load_from_str(DEFAULT_PATCHES)
}

fn validated(config: PatchConfig) -> Result<PatchConfig, ConfigError> {
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}
