use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Boundary checks for the package output directory.
///
/// Installing a package replaces a whole directory, so the guard makes sure
/// the replaced directory lies strictly inside the configured output root and
/// that the root itself is not a directory whose loss would be catastrophic.
#[derive(Debug, Clone)]
pub struct OutputGuard {
    /// Canonical output root
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside the output root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("refusing to use {path} as output root")]
    ForbiddenRoot { path: PathBuf },

    #[error("package name {name:?} is not a single path component")]
    InvalidName { name: String },

    #[error("failed to resolve path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl OutputGuard {
    /// Create the output root if needed and guard it.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let root = root.canonicalize()?;

        let is_fs_root = root.parent().is_none();
        let is_home = home::home_dir()
            .and_then(|h| h.canonicalize().ok())
            .is_some_and(|h| h == root);
        if is_fs_root || is_home {
            return Err(SafetyError::ForbiddenRoot { path: root });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for package `name` under the root.
    pub fn package_dir(&self, name: &str) -> Result<PathBuf, SafetyError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => {
                return Err(SafetyError::InvalidName {
                    name: name.to_string(),
                })
            }
        }
        let dir = self.root.join(name);
        self.check(&dir)?;
        Ok(dir)
    }

    /// Check that an existing path resolves inside the root.
    ///
    /// Symlinks are resolved, so a link pointing out of the root is rejected.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let canonical = path.as_ref().canonicalize()?;
        self.check(&canonical)?;
        Ok(canonical)
    }

    fn check(&self, path: &Path) -> Result<(), SafetyError> {
        if path == self.root || !path.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }
        Ok(())
    }
}
