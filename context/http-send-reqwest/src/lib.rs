//! [`HttpSend`] implementation backed by [`reqwest`].

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use alioss_core::{Error, ErrorKind, HttpSend, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use log::debug;
use reqwest::{Client, Request};

/// ReqwestHttpSend sends requests with a shared [`reqwest::Client`].
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a client with the given connect timeout and read deadline.
    ///
    /// The read timeout is an absolute deadline for the whole exchange,
    /// counted from the moment the request starts, not an idle timeout.
    pub fn with_timeouts(
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = connect_timeout.filter(|v| !v.is_zero()) {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = read_timeout.filter(|v| !v.is_zero()) {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            Error::config_invalid(format!("failed to build http client: {e}")).with_source(e)
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid(format!("invalid http request: {e}")).with_source(e)
        })?;

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| classify(e).with_method(method.clone()))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| classify(e).with_method(method))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

/// Map a reqwest failure onto the error kind the retry classifier inspects.
fn classify(err: reqwest::Error) -> Error {
    let kind = classify_kind(&err);
    debug!("http send failed with {kind}: {err:?}");
    Error::new(kind, err.to_string()).with_source(err)
}

fn classify_kind(err: &reqwest::Error) -> ErrorKind {
    if err.is_connect() {
        if source_chain_contains(err, "dns error") {
            return ErrorKind::Dns;
        }
        return ErrorKind::Connect;
    }
    if err.is_timeout() {
        return ErrorKind::Timeout;
    }
    if let Some(kind) = io_error_kind(err) {
        return kind;
    }
    if source_chain_contains(err, "connection closed before message completed") {
        return ErrorKind::UnexpectedEof;
    }
    if err.is_body() || err.is_decode() {
        return ErrorKind::Read;
    }
    ErrorKind::Unexpected
}

fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    let mut cur = err.source();
    while let Some(e) = cur {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return match io_err.kind() {
                io::ErrorKind::UnexpectedEof => Some(ErrorKind::UnexpectedEof),
                io::ErrorKind::BrokenPipe => Some(ErrorKind::Write),
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::TimedOut => Some(ErrorKind::Read),
                _ => None,
            };
        }
        cur = e.source();
    }
    None
}

fn source_chain_contains(err: &(dyn StdError + 'static), needle: &str) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = cur {
        if e.to_string().contains(needle) {
            return true;
        }
        cur = e.source();
    }
    false
}
