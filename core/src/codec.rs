//! Content codecs: converting values to and from request/response bodies.
//!
//! # Design
//! A codec implements `encode_value` and `decode_value` for present inputs
//! only. The provided `encode` and `decode` methods handle absent inputs
//! (`None` in, `None` out) so every codec shares the same pass-through rule.
//! The advertised mime types decide the `Accept` and `Content-Type` headers
//! a client sends when it uses the codec.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RestError;
use crate::http::MimeType;

pub trait MimeTypeCodec {
    fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, RestError>;

    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, RestError>;

    /// Mime type advertised for what this codec sends.
    fn encoding_mime_type(&self) -> MimeType;

    /// Mime type advertised for what this codec understands.
    fn decoding_mime_type(&self) -> MimeType;

    fn encode<T: Serialize + ?Sized>(&self, value: Option<&T>) -> Result<Option<Vec<u8>>, RestError> {
        match value {
            Some(value) => self.encode_value(value).map(Some),
            None => Ok(None),
        }
    }

    fn decode<T: DeserializeOwned>(&self, bytes: Option<&[u8]>) -> Result<Option<T>, RestError> {
        match bytes {
            Some(bytes) => self.decode_value(bytes).map(Some),
            None => Ok(None),
        }
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl MimeTypeCodec for JsonCodec {
    fn encode_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, RestError> {
        serde_json::to_vec(value).map_err(|e| RestError::Codec(Box::new(e)))
    }

    fn decode_value<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, RestError> {
        serde_json::from_slice(bytes).map_err(|e| RestError::Codec(Box::new(e)))
    }

    fn encoding_mime_type(&self) -> MimeType {
        MimeType::All
    }

    fn decoding_mime_type(&self) -> MimeType {
        MimeType::Json
    }
}
