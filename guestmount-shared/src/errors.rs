//! Error types used across guestmount.

use thiserror::Error;

/// Result type for guestmount operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A remote command exited with a non-zero status.
    #[error("command `{command}` failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The bridging helper is not installed on the guest.
    #[error("'{helper}' is not installed on the guest: {detail}")]
    MissingDependency { helper: String, detail: String },

    /// A guest identity query returned output that is not a numeric id.
    #[error("could not resolve guest identity from `{query}`: unexpected output {output:?}")]
    IdentityResolution { query: String, output: String },

    #[error("session error: {0}")]
    Session(String),

    #[error("bridge server error: {0}")]
    Server(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// True when the failure needs a fix on the guest rather than a retry.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, BridgeError::MissingDependency { .. })
    }

    /// Actionable hint for errors that have one.
    pub fn hint(&self) -> Option<String> {
        match self {
            BridgeError::MissingDependency { helper, .. } => Some(format!(
                "install '{}' on the guest (for example `sudo apt install {}`) and retry",
                helper, helper
            )),
            BridgeError::IdentityResolution { .. } => {
                Some("check that the guest login shell prints nothing on startup".to_string())
            }
            _ => None,
        }
    }
}

// Implement From for common error types to enable `?` operator
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Internal(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Config(format!("JSON error: {}", err))
    }
}

impl From<String> for BridgeError {
    fn from(err: String) -> Self {
        BridgeError::Internal(err)
    }
}

impl From<&str> for BridgeError {
    fn from(err: &str) -> Self {
        BridgeError::Internal(err.to_string())
    }
}
