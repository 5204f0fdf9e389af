//! HTTP vocabulary and the transport boundary.
//!
//! # Design
//! The client never talks to a socket directly. It describes the connection
//! it wants as a `ConnectionRequest` and asks a `Transport` to open it. The
//! resulting `Connection` hands out an output channel for the request body
//! and an input channel for the response, and is released explicitly with
//! `close_output`, `close_input` and `disconnect`. Keeping release explicit
//! lets the client order it and lets tests observe it.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use http::HeaderMap;

use crate::error::RestError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// The verb as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether a request body may be written for this method.
    ///
    /// Every method the client supports accepts one, including GET.
    pub fn allows_body(self) -> bool {
        true
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media types the client knows how to advertise in `Accept` and
/// `Content-Type` headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MimeType {
    All,
    Json,
    Png,
    Text,
    OctetStream,
}

impl MimeType {
    pub fn media_str(self) -> &'static str {
        match self {
            MimeType::All => "*/*",
            MimeType::Json => "application/json",
            MimeType::Png => "image/png",
            MimeType::Text => "text/plain",
            MimeType::OctetStream => "application/octet-stream",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.media_str())
    }
}

/// Everything a transport needs to open one connection.
///
/// `headers` is final: built-in headers and caller overrides have already
/// been merged by the client.
#[derive(Debug, Clone)]
pub struct ConnectionRequest {
    pub url: String,
    pub method: HttpMethod,
    /// True iff a request body will be written to the output channel.
    pub do_output: bool,
    /// Zero means no limit.
    pub connect_timeout: Duration,
    /// Zero means no limit.
    pub read_timeout: Duration,
    pub headers: HeaderMap,
}

/// One open connection to a resource.
///
/// The output channel is only requested when `do_output` was set. Each
/// `close_*` method is called at most once, and only after the matching
/// channel was successfully obtained. `disconnect` is always called last.
pub trait Connection {
    fn output_stream(&mut self) -> io::Result<&mut dyn Write>;

    fn close_output(&mut self) -> io::Result<()>;

    fn input_stream(&mut self) -> io::Result<&mut dyn Read>;

    fn close_input(&mut self) -> io::Result<()>;

    fn disconnect(&mut self);
}

/// Opens connections. This is the seam alternative transports plug into.
pub trait Transport {
    type Connection: Connection;

    fn open(&self, request: ConnectionRequest) -> Result<Self::Connection, RestError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Connection = T::Connection;

    fn open(&self, request: ConnectionRequest) -> Result<Self::Connection, RestError> {
        (**self).open(request)
    }
}
