//! Update pipeline: version check, download, extraction, transformation and
//! package installation.
//!
//! Every stage runs in order and the first failure aborts the run. The state
//! file is written last, so it only ever names a package that was fully
//! installed.

pub mod fetch;
pub mod package;
pub mod settings;
pub mod state;

pub use fetch::{Fetch, FetchError, HttpFetcher};
pub use package::PackageError;
pub use settings::{PipelineSettings, SettingsError};
pub use state::PackageState;

use crate::config::{
    default_config, is_newer, load_from_path, versions_equal, ConfigError, PatchConfig,
};
use crate::edit::EditError;
use crate::extract::{extract, Extraction, BUN_HEADER, BUN_TAIL};
use crate::js::{TransformError, TransformReport, Transformer};
use crate::safety::{OutputGuard, SafetyError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("release channel returned an empty version")]
    EmptyVersion,

    #[error("extracted payload is not UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("failed to write state file: {0}")]
    State(#[source] EditError),

    #[error("package installation failed: {0}")]
    Package(#[from] PackageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The installed package already matches the remote version.
    UpToDate { version: String },
    Updated {
        previous: Option<String>,
        version: String,
        path: PathBuf,
        /// Whether both bundler markers were found in the binary.
        framed: bool,
        report: TransformReport,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub installed: Option<PackageState>,
    pub remote: String,
}

impl Status {
    pub fn is_up_to_date(&self) -> bool {
        self.installed
            .as_ref()
            .is_some_and(|s| versions_equal(&s.version, &self.remote))
    }

    /// Whether the release channel is ahead of the installed package.
    pub fn update_available(&self) -> bool {
        self.installed
            .as_ref()
            .map_or(true, |s| is_newer(&s.version, &self.remote))
    }
}

pub struct Pipeline<F: Fetch> {
    settings: PipelineSettings,
    config: PatchConfig,
    fetcher: F,
    force: bool,
}

impl<F: Fetch> Pipeline<F> {
    pub fn new(settings: PipelineSettings, config: PatchConfig, fetcher: F) -> Self {
        Self {
            settings,
            config,
            fetcher,
            force: false,
        }
    }

    /// Build a pipeline using the patch config named in the settings, or the
    /// bundled defaults.
    pub fn from_settings(settings: PipelineSettings, fetcher: F) -> Result<Self, PipelineError> {
        let config = match &settings.paths.patches {
            Some(path) => load_from_path(path)?,
            None => default_config()?,
        };
        Ok(Self::new(settings, config, fetcher))
    }

    /// Reinstall even when the installed version matches.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn remote_version(&self) -> Result<String, PipelineError> {
        let version = self.fetcher.fetch_text(&self.settings.release.latest_url)?;
        if version.is_empty() {
            return Err(PipelineError::EmptyVersion);
        }
        Ok(version)
    }

    /// Installed and remote versions, without downloading the binary.
    pub fn status(&self) -> Result<Status, PipelineError> {
        Ok(Status {
            installed: PackageState::load(&self.settings.paths.state_file()),
            remote: self.remote_version()?,
        })
    }

    pub fn run(&self) -> Result<RunOutcome, PipelineError> {
        let release = &self.settings.release;
        let state_path = self.settings.paths.state_file();
        let previous = PackageState::load(&state_path);
        let remote = self.remote_version()?;

        let guard = OutputGuard::new(self.settings.paths.output_dir())?;
        let package_dir = guard.package_dir(&self.settings.package.name)?;

        if let Some(state) = previous.as_ref().filter(|_| !self.force) {
            if versions_equal(&state.version, &remote) && package_dir.exists() {
                info!(version = %remote, "already up to date");
                return Ok(RunOutcome::UpToDate { version: remote });
            }
        }

        let url = release.binary_url(&remote);
        info!(version = %remote, %url, "downloading");
        let bytes = self.fetcher.fetch_bytes(&url)?;
        info!(len = bytes.len(), "downloaded");

        let extraction = extract(&bytes, &BUN_HEADER, &BUN_TAIL);
        let framed = extraction.is_framed();
        if !framed {
            warn!(
                header = %extraction.header,
                tail = %extraction.tail,
                "binary is not fully framed; using the unframed remainder as source"
            );
        }
        let source = decode_payload(extraction)?;

        let transformed = Transformer::new(self.settings.bootstrap.clone())
            .transform(&source, &self.config)?;
        info!(report = %transformed.report, "transformed");

        let path = package::install(&guard, &self.settings.package, &remote, &transformed.code)?;

        let state = PackageState {
            name: self.settings.package.name.clone(),
            version: remote.clone(),
            binary: release.binary.clone(),
        };
        state.save(&state_path).map_err(PipelineError::State)?;
        info!(version = %remote, path = %path.display(), "package updated");

        Ok(RunOutcome::Updated {
            previous: previous.map(|s| s.version),
            version: remote,
            path,
            framed,
            report: transformed.report,
        })
    }
}

/// Source text of an extracted payload.
///
/// A framed payload must be UTF-8. Without both markers the payload can
/// still carry executable bytes, so it is cut at the first NUL byte and then
/// at the first invalid UTF-8 sequence.
fn decode_payload(extraction: Extraction) -> Result<String, PipelineError> {
    if extraction.is_framed() {
        return Ok(String::from_utf8(extraction.into_payload())?);
    }

    let mut payload = extraction.into_payload();
    let len = payload.len();
    if let Some(nul) = payload.iter().position(|&b| b == 0) {
        payload.truncate(nul);
    }
    let valid = match std::str::from_utf8(&payload) {
        Ok(text) => text.len(),
        Err(err) => err.valid_up_to(),
    };
    payload.truncate(valid);
    if payload.len() < len {
        warn!(
            kept = payload.len(),
            dropped = len - payload.len(),
            "unframed payload holds non-text bytes; keeping the text prefix"
        );
    }
    Ok(String::from_utf8(payload)?)
}
