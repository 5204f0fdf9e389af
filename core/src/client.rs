//! Request execution against a configured base endpoint.
//!
//! # Design
//! `RestClient` holds the immutable endpoint settings, an optional credential
//! set and the `Transport` used to open connections. `do_request` runs one
//! synchronous round-trip per call on its own connection:
//!
//! 1. compose the resource URL from the base URL and the resource path;
//! 2. open a connection with the method, timeouts and final header set;
//! 3. write the body, if any, to the output channel;
//! 4. read the input channel to end of stream;
//! 5. release output, then input, then the connection.
//!
//! Step 5 is owned by `ConnectionGuard`, whose `Drop` runs on every exit
//! path. Release failures are logged and never replace the call's result.
//!
//! Credentials are read when each connection is opened. Rotating them while
//! a call is in flight affects that call only if it has not yet reached
//! header construction.

use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::auth::AuthCredentials;
use crate::config::EndpointConfig;
use crate::error::RestError;
use crate::http::{Connection, ConnectionRequest, HttpMethod, MimeType, Transport};
use crate::transport::UreqTransport;

pub type SharedCredentials = Arc<dyn AuthCredentials>;

pub struct RestClient<T = UreqTransport> {
    base_url: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    credentials: RwLock<Option<SharedCredentials>>,
    transport: T,
}

impl RestClient<UreqTransport> {
    /// Creates a client for `base_url` using the default blocking transport.
    ///
    /// Negative timeouts are replaced by their absolute value.
    pub fn new(base_url: &str, connect_timeout_ms: i64, read_timeout_ms: i64) -> Result<Self, RestError> {
        Self::with_transport(base_url, connect_timeout_ms, read_timeout_ms, UreqTransport)
    }

    pub fn from_config(config: &EndpointConfig) -> Result<Self, RestError> {
        Self::new(&config.base_url, config.connect_timeout_ms, config.read_timeout_ms)
    }
}

impl<T: Transport> RestClient<T> {
    pub fn with_transport(
        base_url: &str,
        connect_timeout_ms: i64,
        read_timeout_ms: i64,
        transport: T,
    ) -> Result<Self, RestError> {
        let base_url = normalize(base_url);
        if base_url.is_empty() {
            return Err(RestError::invalid_argument("URL cannot be empty"));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            connect_timeout: Duration::from_millis(connect_timeout_ms.unsigned_abs()),
            read_timeout: Duration::from_millis(read_timeout_ms.unsigned_abs()),
            credentials: RwLock::new(None),
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credentials(&self) -> Option<SharedCredentials> {
        self.credentials.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_credentials(&self, credentials: impl AuthCredentials + 'static) {
        self.replace_credentials(Some(Arc::new(credentials)));
    }

    pub fn clear_credentials(&self) {
        self.replace_credentials(None);
    }

    pub fn replace_credentials(&self, credentials: Option<SharedCredentials>) {
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    /// Joins `resource` onto the base URL.
    ///
    /// An absent or empty resource yields the base URL. A trailing slash on
    /// the resource is dropped, and a `/` is inserted unless the resource
    /// already starts with one.
    pub fn resource_url(&self, resource: Option<&str>) -> Result<String, RestError> {
        let url = match resource.map(normalize) {
            None | Some("") => self.base_url.clone(),
            Some(path) if path.starts_with('/') => format!("{}{path}", self.base_url),
            Some(path) => format!("{}/{path}", self.base_url),
        };
        url::Url::parse(&url).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("malformed resource URL {url}: {e}"))
        })?;
        Ok(url)
    }

    /// Opens a configured connection to `url` without touching the body.
    ///
    /// Headers are applied in order: `Accept`, `Content-Type`,
    /// `Authorization` (when credentials are set), then every entry of
    /// `extra_headers`, which replaces any built-in header of the same name.
    ///
    /// Header names are case-insensitive. Caller entries are applied in
    /// byte order of their keys, so when two keys differ only in case
    /// (`X-Tag` and `x-tag`) the lowercase spelling is applied last and wins.
    pub fn open_connection(
        &self,
        url: &str,
        has_body: bool,
        method: HttpMethod,
        accept: MimeType,
        content_type: MimeType,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<T::Connection, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(accept.media_str()));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type.media_str()));

        if let Some(credentials) = self.credentials() {
            let token = credentials.auth_token()?;
            headers.insert(AUTHORIZATION, HeaderValue::try_from(token)?);
        }

        let mut extra: Vec<_> = extra_headers.into_iter().flatten().collect();
        extra.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (name, value) in extra {
            let name = HeaderName::try_from(name.as_str())?;
            headers.insert(name, HeaderValue::try_from(value.as_str())?);
        }

        self.transport.open(ConnectionRequest {
            url: url.to_string(),
            method,
            do_output: has_body && method.allows_body(),
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
            headers,
        })
    }

    /// Performs one request and returns the full response body.
    pub fn do_request(
        &self,
        resource: Option<&str>,
        body: Option<&[u8]>,
        method: HttpMethod,
        accept: MimeType,
        content_type: MimeType,
        extra_headers: Option<&HashMap<String, String>>,
    ) -> Result<Vec<u8>, RestError> {
        let url = self.resource_url(resource)?;
        debug!(%url, %method, has_body = body.is_some(), "issuing request");

        let connection = self.open_connection(&url, body.is_some(), method, accept, content_type, extra_headers)?;
        let mut guard = ConnectionGuard::new(connection);

        if let Some(body) = body {
            let output = guard.connection.output_stream()?;
            guard.output_open = true;
            output.write_all(body)?;
            output.flush()?;
        }

        let input = guard.connection.input_stream()?;
        guard.input_open = true;
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;

        debug!(%url, len = bytes.len(), "response received");
        Ok(bytes)
    }
}

/// Releases a connection's channels and the connection itself on drop.
struct ConnectionGuard<C: Connection> {
    connection: C,
    output_open: bool,
    input_open: bool,
}

impl<C: Connection> ConnectionGuard<C> {
    fn new(connection: C) -> Self {
        Self {
            connection,
            output_open: false,
            input_open: false,
        }
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if self.output_open {
            if let Err(e) = self.connection.close_output() {
                warn!(error = %e, "unable to close output stream");
            }
        }
        if self.input_open {
            if let Err(e) = self.connection.close_input() {
                warn!(error = %e, "unable to close input stream");
            }
        }
        self.connection.disconnect();
    }
}

fn normalize(url: &str) -> &str {
    url.trim_end_matches('/')
}
