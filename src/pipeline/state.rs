use crate::edit::{atomic_write, EditError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// What the last successful run installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageState {
    pub name: String,
    pub version: String,
    /// Binary name the package was built from.
    pub binary: String,
}

impl PackageState {
    /// Read the state file. A missing or unreadable file means no prior
    /// state.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read state file, treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "state file is not valid, treating as absent");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), EditError> {
        let mut json = serde_json::to_vec_pretty(self)
            .map_err(|e| EditError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        json.push(b'\n');
        atomic_write(path, &json)
    }
}
