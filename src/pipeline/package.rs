//! Package directory materialization.

use crate::edit::{atomic_write, EditError};
use crate::pipeline::settings::PackageSettings;
use crate::safety::{OutputGuard, SafetyError};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("failed to write package file: {0}")]
    Write(#[from] EditError),

    #[error("failed to serialize package manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to install package at {path}: {source}")]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The `package.json` of an installed package.
pub fn manifest(settings: &PackageSettings, version: &str) -> serde_json::Value {
    let mut bin = serde_json::Map::new();
    bin.insert(settings.bin_name().to_string(), json!(settings.entry));
    json!({
        "name": settings.name,
        "version": version,
        "main": settings.entry,
        "bin": bin,
        "type": "commonjs",
        "dependencies": settings.dependencies,
    })
}

/// Write the package into a staging directory under the output root, then
/// swap it into `<root>/<name>`. The previous package is removed only after
/// the new one is in place.
pub fn install(
    guard: &OutputGuard,
    settings: &PackageSettings,
    version: &str,
    code: &str,
) -> Result<PathBuf, PackageError> {
    let target = guard.package_dir(&settings.name)?;
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| PackageError::Install { path, source }
    };

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(guard.root())
        .map_err(io_err(guard.root()))?;

    make_executable(staging.path()).map_err(io_err(staging.path()))?;
    let entry = staging.path().join(&settings.entry);
    atomic_write(&entry, code.as_bytes())?;
    make_executable(&entry).map_err(io_err(&entry))?;

    let mut package_json = serde_json::to_vec_pretty(&manifest(settings, version))?;
    package_json.push(b'\n');
    atomic_write(&staging.path().join("package.json"), &package_json)?;

    let previous = tempfile::Builder::new()
        .prefix(".previous-")
        .tempdir_in(guard.root())
        .map_err(io_err(guard.root()))?;
    let parked = previous.path().join(&settings.name);
    let had_previous = target.exists();
    if had_previous {
        // Never move aside a directory that resolves outside the root
        guard.validate_path(&target)?;
        fs::rename(&target, &parked).map_err(io_err(&target))?;
    }
    if let Err(source) = fs::rename(staging.path(), &target) {
        if had_previous {
            // Put the old package back; the install error is what matters
            let _ = fs::rename(&parked, &target);
        }
        return Err(PackageError::Install {
            path: target,
            source,
        });
    }
    debug!(path = %target.display(), replaced = had_previous, "package installed");
    Ok(target)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
