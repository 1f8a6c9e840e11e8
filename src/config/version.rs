//! Version comparison for release bookkeeping.
//!
//! Release channels publish plain version strings. When both sides parse as
//! semver they are compared as versions (so `1.2.0` and `v1.2.0` agree);
//! otherwise the trimmed strings are compared verbatim.

use semver::Version;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone)]
pub enum VersionError {
    /// Invalid version string (e.g., "not-a-version")
    InvalidVersion { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Parse a release version, tolerating a leading `v` and surrounding
/// whitespace.
pub fn parse_version(value: &str) -> Result<Version, VersionError> {
    let trimmed = value.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| VersionError::InvalidVersion {
        value: value.to_string(),
        source: e.to_string(),
    })
}

/// Whether two release versions name the same release.
///
/// # Examples
///
/// ```
/// use bundle_patcher::config::version::versions_equal;
///
/// assert!(versions_equal("1.0.33", "v1.0.33\n"));
/// assert!(!versions_equal("1.0.33", "1.0.34"));
/// assert!(versions_equal("nightly", "nightly"));
/// ```
pub fn versions_equal(stored: &str, remote: &str) -> bool {
    match (parse_version(stored), parse_version(remote)) {
        (Ok(a), Ok(b)) => a == b,
        _ => stored.trim() == remote.trim(),
    }
}

/// Whether `remote` is a newer release than `stored`.
///
/// Unparseable versions are considered newer whenever they differ, so a
/// channel that switches to non-semver tags still triggers an update.
pub fn is_newer(stored: &str, remote: &str) -> bool {
    match (parse_version(stored), parse_version(remote)) {
        (Ok(a), Ok(b)) => b.cmp(&a) == Ordering::Greater,
        _ => stored.trim() != remote.trim(),
    }
}
