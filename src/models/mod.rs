//! # Domain Models
//!
//! Credentials and remote endpoint configuration.
//!
//! [`SecureString`] zeroes password bytes on drop and never exposes them in
//! `Debug`. Passwords travel to the transport on stdin only; they are never
//! placed in process arguments or log lines.

pub mod credentials;
pub mod remote;

pub use credentials::{Credentials, SecureString, Username};
pub use remote::WinRmConfig;
