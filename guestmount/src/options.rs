//! Mount configuration.

use std::path::Path;

use guestmount_shared::constants::{
    DEFAULT_HELPER, DEFAULT_PRIVILEGE_PREFIX, DEFAULT_THREAD_NAME_PREFIX,
};
use guestmount_shared::errors::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};

use crate::command::GuestCommands;
use crate::materialize::ExistenceProbe;

/// Options controlling how a mount is provisioned on the guest.
///
/// Every field has a default, so a configuration file only needs to name the
/// values it changes:
///
/// ```
/// use guestmount::{ExistenceProbe, MountOptions};
///
/// let options: MountOptions = serde_json::from_str(r#"{"existence_probe": "host"}"#).unwrap();
/// assert_eq!(options.helper, "sshfs");
/// assert_eq!(options.existence_probe, ExistenceProbe::Host);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountOptions {
    /// Helper binary that must be installed on the guest.
    pub helper: String,
    /// Prefix for commands that need elevated privileges (`None` = run as is).
    pub privilege_prefix: Option<String>,
    /// Where directory existence is checked during materialization.
    pub existence_probe: ExistenceProbe,
    /// Name prefix for the bridge worker thread.
    pub thread_name_prefix: String,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            helper: DEFAULT_HELPER.to_string(),
            privilege_prefix: Some(DEFAULT_PRIVILEGE_PREFIX.to_string()),
            existence_probe: ExistenceProbe::default(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl MountOptions {
    /// Load options from a JSON file.
    pub fn from_json_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let options: MountOptions = serde_json::from_str(&content)?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values that cannot produce a usable command line.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.helper.is_empty() {
            return Err(BridgeError::Config("helper must not be empty".into()));
        }
        if self.helper.chars().any(char::is_whitespace) {
            return Err(BridgeError::Config(format!(
                "helper must be a single program name, got {:?}",
                self.helper
            )));
        }
        if self.thread_name_prefix.contains('\0') {
            return Err(BridgeError::Config(
                "thread_name_prefix must not contain NUL bytes".into(),
            ));
        }
        Ok(())
    }

    /// Command renderer for these options.
    pub fn commands(&self) -> GuestCommands {
        GuestCommands::new(self.privilege_prefix.clone())
    }
}
