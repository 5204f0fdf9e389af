//! Minimal extensible blocking REST client.
//!
//! # Overview
//! `RestClient` issues requests against a configured base URL, attaching
//! `Accept`, `Content-Type` and optional `Authorization` headers, writing the
//! request body and collecting the full response. `TypedRestClient` pairs it
//! with a `MimeTypeCodec` so callers work with typed values instead of bytes.
//!
//! # Design
//! - One synchronous round-trip per call, on a fresh connection. No pooling,
//!   retries or async runtime.
//! - Connections come from a `Transport`; `UreqTransport` is the default and
//!   tests substitute in-memory ones.
//! - Output channel, input channel and connection are released on every exit
//!   path, in that order.
//! - Caller-supplied headers are applied last and win over built-in ones.

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod typed;

pub use auth::{AuthCredentials, BasicAuthCredentials};
pub use client::{RestClient, SharedCredentials};
pub use codec::{JsonCodec, MimeTypeCodec};
pub use config::EndpointConfig;
pub use error::RestError;
pub use crate::http::{Connection, ConnectionRequest, HttpMethod, MimeType, Transport};
pub use transport::UreqTransport;
pub use typed::TypedRestClient;
