//! Typed requests: a `RestClient` paired with a content codec.
//!
//! Every operation encodes the request value with the codec, runs it through
//! `RestClient::do_request` with the codec's advertised mime types as
//! `Accept` and `Content-Type`, and decodes the response into the requested
//! type. Errors from any of the three steps are returned as-is.

use std::collections::HashMap;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::RestClient;
use crate::codec::MimeTypeCodec;
use crate::config::EndpointConfig;
use crate::error::RestError;
use crate::http::{HttpMethod, Transport};
use crate::transport::UreqTransport;

pub struct TypedRestClient<C, T = UreqTransport> {
    client: RestClient<T>,
    codec: C,
}

impl<C: MimeTypeCodec> TypedRestClient<C, UreqTransport> {
    pub fn new(base_url: &str, codec: C, connect_timeout_ms: i64, read_timeout_ms: i64) -> Result<Self, RestError> {
        Ok(Self::from_client(RestClient::new(base_url, connect_timeout_ms, read_timeout_ms)?, codec))
    }

    pub fn from_config(config: &EndpointConfig, codec: C) -> Result<Self, RestError> {
        Ok(Self::from_client(RestClient::from_config(config)?, codec))
    }
}

impl<C: MimeTypeCodec, T: Transport> TypedRestClient<C, T> {
    pub fn from_client(client: RestClient<T>, codec: C) -> Self {
        Self { client, codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn read<B, R>(
        &self,
        resource: Option<&str>,
        body: Option<&B>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<R, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.exchange(HttpMethod::Get, resource, body, headers)
    }

    pub fn create<B, R>(
        &self,
        resource: Option<&str>,
        body: Option<&B>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<R, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.exchange(HttpMethod::Post, resource, body, headers)
    }

    pub fn update<B, R>(
        &self,
        resource: Option<&str>,
        body: Option<&B>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<R, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.exchange(HttpMethod::Put, resource, body, headers)
    }

    pub fn delete<B, R>(
        &self,
        resource: Option<&str>,
        body: Option<&B>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<R, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.exchange(HttpMethod::Delete, resource, body, headers)
    }

    fn exchange<B, R>(
        &self,
        method: HttpMethod,
        resource: Option<&str>,
        body: Option<&B>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<R, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.codec.encode(body)?;
        let bytes = self.client.do_request(
            resource,
            body.as_deref(),
            method,
            self.codec.encoding_mime_type(),
            self.codec.decoding_mime_type(),
            headers,
        )?;
        self.codec.decode_value(&bytes)
    }
}

/// Exposes the underlying client, e.g. for `set_credentials`.
impl<C, T> Deref for TypedRestClient<C, T> {
    type Target = RestClient<T>;

    fn deref(&self) -> &RestClient<T> {
        &self.client
    }
}
