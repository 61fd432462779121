//! Credential types used to authenticate WinRM sessions
//!
//! SECURITY: Credential types implement Drop to clear sensitive data.

use crate::utils::CredentialError;
use serde::{Deserialize, Deserializer};
use std::fmt;

const MAX_USERNAME_LEN: usize = 256;

/// Windows username in one of the accepted forms
///
/// - `user`
/// - `.\\user`
/// - `DOMAIN\\user`
/// - `user@domain.com`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(username: impl Into<String>) -> Result<Self, CredentialError> {
        let username = username.into();
        let trimmed = username.trim();

        if trimmed.is_empty() {
            return Err(CredentialError::InvalidUsername(
                "Username cannot be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_USERNAME_LEN {
            return Err(CredentialError::InvalidUsername(format!(
                "Username exceeds maximum length ({})",
                MAX_USERNAME_LEN
            )));
        }

        Ok(Username(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Password that zeros its memory on drop
///
/// SECURITY: Neither `Debug` nor any other impl reveals the content.
#[derive(Clone, Default)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(password: impl Into<String>) -> Self {
        SecureString(password.into())
    }

    /// Borrow the secret. Only hand this to the transport.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecureString {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        for byte in bytes.iter_mut() {
            // SAFETY: `byte` is a valid, exclusively borrowed u8 inside a live Vec
            unsafe { std::ptr::write_volatile(byte, 0) };
        }
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString(*** {} bytes ***)", self.0.len())
    }
}

impl<'de> Deserialize<'de> for SecureString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(SecureString)
    }
}

/// Validated username/password pair for one remote host
#[derive(Clone, Debug)]
pub struct Credentials {
    username: Username,
    password: SecureString,
}

impl Credentials {
    pub fn new(username: Username, password: SecureString) -> Self {
        Credentials { username, password }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn password(&self) -> &SecureString {
        &self.password
    }
}
