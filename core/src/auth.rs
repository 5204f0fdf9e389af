//! Authentication credentials attached to outgoing requests.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::RestError;

/// Produces the value of the `Authorization` header.
///
/// The token is computed on every request, so an implementation may rotate
/// its secret between calls.
pub trait AuthCredentials: Send + Sync {
    fn auth_token(&self) -> Result<String, RestError>;
}

/// HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthCredentials {
    username: String,
    password: String,
}

impl BasicAuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, RestError> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() {
            return Err(RestError::invalid_argument("username cannot be empty"));
        }
        if password.is_empty() {
            return Err(RestError::invalid_argument("password cannot be empty"));
        }
        Ok(Self { username, password })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl AuthCredentials for BasicAuthCredentials {
    fn auth_token(&self) -> Result<String, RestError> {
        let pair = format!("{}:{}", self.username, self.password);
        Ok(format!("Basic {}", STANDARD.encode(pair.as_bytes())))
    }
}

impl fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
