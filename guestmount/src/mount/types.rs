//! Identifiers and endpoints for mounts.

use std::fmt;
use std::path::{Path, PathBuf};

use guestmount_shared::errors::{BridgeError, BridgeResult};

/// Mount identifier (ULID, sortable by creation time).
///
/// ```
/// use guestmount::MountId;
///
/// let id = MountId::new();
/// assert_eq!(id.as_str().len(), 26);
/// assert_eq!(id.short().len(), 8);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MountId(String);

impl MountId {
    pub const FULL_LENGTH: usize = 26;
    pub const SHORT_LENGTH: usize = 8;

    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for thread names and display.
    pub fn short(&self) -> &str {
        &self.0[..Self::SHORT_LENGTH]
    }
}

impl Default for MountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MountId({})", self.short())
    }
}

/// Host directory and the guest path it is exposed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEndpoint {
    source: PathBuf,
    target: String,
}

impl MountEndpoint {
    /// Both paths must be absolute. Backslashes in `target` are read as `/`.
    pub fn new(source: impl Into<PathBuf>, target: &str) -> BridgeResult<Self> {
        let source = source.into();
        if !source.is_absolute() {
            return Err(BridgeError::Config(format!(
                "mount source must be an absolute host path: {}",
                source.display()
            )));
        }

        let target = target.replace('\\', "/");
        if !target.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "mount target must be an absolute guest path: {}",
                target
            )));
        }

        Ok(Self { source, target })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(MountId::new(), MountId::new());
    }

    #[test]
    fn endpoint_requires_absolute_paths() {
        assert!(MountEndpoint::new("relative/dir", "/mnt").is_err());
        assert!(MountEndpoint::new("/home/user/project", "mnt/project").is_err());

        let endpoint = MountEndpoint::new("/home/user/project", "\\mnt\\project").unwrap();
        assert_eq!(endpoint.target(), "/mnt/project");
        assert_eq!(endpoint.source(), Path::new("/home/user/project"));
    }
}
