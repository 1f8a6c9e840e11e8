use crate::js::Bootstrap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Toml(#[from] toml_edit::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Orchestrator settings, read from TOML.
///
/// ```toml
/// [release]
/// latest_url = "https://downloads.example.com/tool/latest"
/// binary_url = "https://downloads.example.com/tool/{version}/{platform}/{binary}"
/// binary = "tool"
///
/// [package]
/// name = "tool"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    pub release: ReleaseSettings,
    pub package: PackageSettings,
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub bootstrap: Bootstrap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSettings {
    /// Document containing the latest version string.
    pub latest_url: String,
    /// Binary download URL; `{version}`, `{platform}` and `{binary}` are
    /// substituted.
    pub binary_url: String,
    pub binary: String,
    /// Defaults to the host platform, e.g. `linux-x64`.
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSettings {
    pub name: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Command name in `bin`; defaults to the package name.
    #[serde(default)]
    pub bin: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathSettings {
    pub output: Option<PathBuf>,
    pub state: Option<PathBuf>,
    /// Patch config; the bundled defaults apply when unset.
    pub patches: Option<PathBuf>,
}

fn default_entry() -> String {
    "cli.js".to_string()
}

impl ReleaseSettings {
    pub fn platform(&self) -> String {
        self.platform.clone().unwrap_or_else(host_platform)
    }

    pub fn binary_url(&self, version: &str) -> String {
        self.binary_url
            .replace("{version}", version)
            .replace("{platform}", &self.platform())
            .replace("{binary}", &self.binary)
    }
}

impl PackageSettings {
    pub fn bin_name(&self) -> &str {
        self.bin.as_deref().unwrap_or(&self.name)
    }
}

impl PathSettings {
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            home::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share/bundle-patcher")
        })
    }

    pub fn state_file(&self) -> PathBuf {
        self.state
            .clone()
            .unwrap_or_else(|| self.output_dir().join("state.json"))
    }
}

/// Host platform in the `<os>-<arch>` spelling release channels use.
pub fn host_platform() -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        other => other,
    };
    format!("{os}-{arch}")
}

impl PipelineSettings {
    pub fn from_toml(input: &str) -> Result<Self, SettingsError> {
        let settings: PipelineSettings = toml_edit::de::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.release.latest_url.trim().is_empty() {
            return Err(SettingsError::Invalid("release.latest_url is empty".into()));
        }
        if !self.release.binary_url.contains("{version}") {
            return Err(SettingsError::Invalid(
                "release.binary_url has no {version} placeholder".into(),
            ));
        }
        if self.package.name.trim().is_empty() || self.package.entry.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "package.name and package.entry must be set".into(),
            ));
        }
        for (key, value) in [
            ("release.binary", &self.release.binary),
            ("package.entry", &self.package.entry),
        ] {
            if !is_file_name(value) {
                return Err(SettingsError::Invalid(format!(
                    "{key} must be a plain file name, got {value:?}"
                )));
            }
        }
        Ok(())
    }
}

/// A single normal path component: no separators, no `.` or `..`.
fn is_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
