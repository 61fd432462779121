//! Error types for sysprobe
//!
//! All error types use thiserror for clean error handling.
//! SECURITY: Error messages MUST NOT contain passwords or sensitive data.

/// Top-level error type for probe operations
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Command failed: {0}")]
    Exec(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Probe '{0}' finished without reporting a result")]
    NoReply(&'static str),

    #[error("{0}")]
    Panicked(String),

    #[error("'{probe}' is not supported on {platform}")]
    Unsupported {
        probe: &'static str,
        platform: String,
    },

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Unknown probe: {0}")]
    UnknownProbe(String),
}

impl From<CredentialError> for ProbeError {
    fn from(err: CredentialError) -> Self {
        ProbeError::InvalidOption(err.to_string())
    }
}

/// Errors from remote session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("WinRM error: {0}")]
    WinRm(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),
}

/// Errors from credential handling
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid username format: {0}")]
    InvalidUsername(String),

    #[error("Missing remote host")]
    MissingHost,
}
