//! Blocking transport backed by `ureq`.
//!
//! # Design
//! ureq sends a request and its body in one call, while `Connection` exposes
//! the body as a writable channel. `UreqConnection` buffers whatever is
//! written to the output channel and performs the round-trip when the input
//! channel is opened. Each connection builds its own agent, so nothing is
//! pooled or shared between calls.
//!
//! The read timeout bounds the wait for the response head and then every
//! single read of the body. ureq only knows a deadline for the whole body,
//! so the body limit is applied by `ReadTimeoutConnector`, which wraps the
//! socket of the default connector chain.

use std::io::{self, Read, Write};
use std::time::Duration;

use http::HeaderMap;
use tracing::trace;
use ureq::typestate::{WithBody, WithoutBody};
use ureq::unversioned::resolver::DefaultResolver;
use ureq::unversioned::transport::{
    self as wire, Buffers, ConnectionDetails, Connector, DefaultConnector, NextTimeout,
};
use ureq::{Agent, Body, BodyReader, RequestBuilder};

use crate::error::RestError;
use crate::http::{Connection, ConnectionRequest, HttpMethod, Transport};

/// The default transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    type Connection = UreqConnection;

    fn open(&self, request: ConnectionRequest) -> Result<Self::Connection, RestError> {
        Ok(UreqConnection {
            request,
            output: None,
            input: None,
        })
    }
}

pub struct UreqConnection {
    request: ConnectionRequest,
    output: Option<Vec<u8>>,
    input: Option<BodyInput<BodyReader<'static>>>,
}

impl UreqConnection {
    fn agent(&self) -> Agent {
        let read_timeout = limit(self.request.read_timeout);
        let config = Agent::config_builder()
            .timeout_connect(limit(self.request.connect_timeout))
            .timeout_recv_response(read_timeout)
            .timeout_recv_body(None)
            .build();
        let connector = DefaultConnector::new().chain(ReadTimeoutConnector { read_timeout });
        Agent::with_parts(config, connector, DefaultResolver::default())
    }

    fn send(&mut self) -> io::Result<BodyInput<BodyReader<'static>>> {
        let agent = self.agent();
        let url = self.request.url.as_str();
        let headers = &self.request.headers;
        let body = if self.request.do_output { self.output.take() } else { None };
        trace!(%url, method = %self.request.method, "sending request");

        let response = match self.request.method {
            HttpMethod::Get => send_without_body(with_headers(agent.get(url), headers), body),
            HttpMethod::Delete => send_without_body(with_headers(agent.delete(url), headers), body),
            HttpMethod::Post => send_with_body(with_headers(agent.post(url), headers), body),
            HttpMethod::Put => send_with_body(with_headers(agent.put(url), headers), body),
        }
        .map_err(into_io)?;

        Ok(BodyInput(response.into_body().into_reader()))
    }
}

impl Connection for UreqConnection {
    fn output_stream(&mut self) -> io::Result<&mut dyn Write> {
        if !self.request.do_output {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "connection has output disabled"));
        }
        Ok(self.output.get_or_insert_with(Vec::new))
    }

    fn close_output(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn input_stream(&mut self) -> io::Result<&mut dyn Read> {
        let reader = match self.input.take() {
            Some(reader) => reader,
            None => self.send()?,
        };
        Ok(self.input.insert(reader))
    }

    fn close_input(&mut self) -> io::Result<()> {
        self.input = None;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.output = None;
        self.input = None;
    }
}

/// ureq reads `None` as "no limit", which is what a zero timeout means here.
fn limit(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// Chained after the default connector. Caps every wait for input at the
/// read timeout, counted from the start of that wait.
#[derive(Debug)]
struct ReadTimeoutConnector {
    read_timeout: Option<Duration>,
}

impl Connector<Box<dyn wire::Transport>> for ReadTimeoutConnector {
    type Out = ReadTimeoutTransport;

    fn connect(
        &self,
        _: &ConnectionDetails,
        chained: Option<Box<dyn wire::Transport>>,
    ) -> Result<Option<Self::Out>, ureq::Error> {
        Ok(chained.map(|inner| ReadTimeoutTransport {
            inner,
            read_timeout: self.read_timeout,
        }))
    }
}

#[derive(Debug)]
struct ReadTimeoutTransport {
    inner: Box<dyn wire::Transport>,
    read_timeout: Option<Duration>,
}

impl wire::Transport for ReadTimeoutTransport {
    fn buffers(&mut self) -> &mut dyn Buffers {
        self.inner.buffers()
    }

    fn transmit_output(&mut self, amount: usize, timeout: NextTimeout) -> Result<(), ureq::Error> {
        self.inner.transmit_output(amount, timeout)
    }

    fn await_input(&mut self, timeout: NextTimeout) -> Result<bool, ureq::Error> {
        self.inner.await_input(per_read(timeout, self.read_timeout))
    }

    fn is_open(&mut self) -> bool {
        self.inner.is_open()
    }

    fn is_tls(&self) -> bool {
        self.inner.is_tls()
    }
}

/// The sooner of ureq's own deadline and a fresh read timeout. While the
/// body is read ureq has no deadline, so the read timeout always applies.
fn per_read(timeout: NextTimeout, read_timeout: Option<Duration>) -> NextTimeout {
    match read_timeout.map(wire::time::Duration::from) {
        Some(after) if after < timeout.after => NextTimeout {
            after,
            reason: ureq::Timeout::RecvBody,
        },
        _ => timeout,
    }
}

/// Response body that reports ureq timeouts as `ErrorKind::TimedOut`.
struct BodyInput<R>(R);

impl<R: Read> Read for BodyInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(|err| into_io(ureq::Error::from(err)))
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &HeaderMap) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.clone());
    }
    builder
}

fn send_without_body(
    builder: RequestBuilder<WithoutBody>,
    body: Option<Vec<u8>>,
) -> Result<http::Response<Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.force_send_body().send(&bytes[..]),
        None => builder.call(),
    }
}

fn send_with_body(
    builder: RequestBuilder<WithBody>,
    body: Option<Vec<u8>>,
) -> Result<http::Response<Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(&bytes[..]),
        None => builder.send_empty(),
    }
}

fn into_io(err: ureq::Error) -> io::Error {
    match err {
        ureq::Error::Io(err) => err,
        ureq::Error::Timeout(_) => io::Error::new(io::ErrorKind::TimedOut, err),
        other => io::Error::other(other),
    }
}
