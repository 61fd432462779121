//! # Utilities Module
//!
//! Cross-cutting concerns shared by the framework, the probe library and the
//! platform backends.
//!
//! - [`errors`]: typed error hierarchy using `thiserror`
//! - [`retry`]: exponential backoff for transient WinRM failures
//!
//! Error types live here so `core`, `probes` and `platform` can all depend on
//! them without depending on each other.

pub mod errors;
pub mod retry;

pub use errors::{CredentialError, ProbeError, SessionError};
pub use retry::{is_transient_error, is_transient_session_error, retry_with_backoff, RetryConfig};
