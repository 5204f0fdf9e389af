//! Error types for the REST client.
//!
//! # Design
//! Every layer of the client (credentials, codec, transport) reports through
//! the same `RestError` so callers can propagate with `?` from any operation.
//! Failures from lower layers are carried unmodified: a codec error stays a
//! codec error and an I/O failure keeps its original `std::io::Error`.

use std::io;

/// Errors returned by the client, its codecs and its credentials.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// A constructor or call received an input it cannot work with
    /// (empty URL, empty username, malformed header).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Credentials could not be turned into a transmittable token.
    #[error("credential encoding failed: {0}")]
    Encoding(String),

    /// A value could not be serialized or a payload could not be decoded.
    #[error("codec failed: {0}")]
    Codec(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Opening, writing to or reading from the connection failed, or the
    /// resource URL could not be composed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RestError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        RestError::InvalidArgument(message.into())
    }

    /// The underlying I/O error, if this is a transport failure.
    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            RestError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<http::header::InvalidHeaderName> for RestError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        RestError::InvalidArgument(format!("invalid header name: {err}"))
    }
}

impl From<http::header::InvalidHeaderValue> for RestError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        RestError::InvalidArgument(format!("invalid header value: {err}"))
    }
}
