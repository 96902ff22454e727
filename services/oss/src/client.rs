use std::future::Future;

use alioss_core::time::now;
use alioss_core::{AttemptStrategy, Context, Error, OsEnv, Result, ServiceError};
use alioss_http_send_reqwest::ReqwestHttpSend;
use bytes::Bytes;
use http::StatusCode;
use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::request::{Request, ResolvedRequest};
use crate::retry::should_retry;
use crate::types::GetServiceResp;
use crate::{Bucket, Config, Credential, Region};

/// Client talks to the OSS endpoint of one region.
///
/// Cloning a client is cheap; clones share the HTTP transport.
#[derive(Clone, Debug)]
pub struct Client {
    ctx: Context,
    credential: Credential,
    region: Region,
    internal: bool,
    retry: AttemptStrategy,
}

impl Client {
    /// Create a client sending requests with reqwest.
    ///
    /// Values missing from `config` are loaded from the environment.
    pub fn new(config: Config) -> Result<Self> {
        let http = ReqwestHttpSend::with_timeouts(config.connect_timeout, config.read_timeout)?;
        let ctx = Context::new().with_env(OsEnv).with_http_send(http);
        Self::with_context(config, ctx)
    }

    /// Create a client on top of an existing [`Context`].
    pub fn with_context(config: Config, ctx: Context) -> Result<Self> {
        let config = config.from_env(&ctx);
        let credential = Credential::new(
            config.access_key_id.as_deref().unwrap_or_default(),
            config.access_key_secret.as_deref().unwrap_or_default(),
        );
        if !credential.is_valid() {
            return Err(Error::credential_invalid(
                "access key id and access key secret are required",
            ));
        }

        Ok(Self {
            ctx,
            credential,
            region: config.region.unwrap_or_default(),
            internal: config.internal.unwrap_or_default(),
            retry: config.retry,
        })
    }

    /// Region this client talks to.
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> String {
        self.region.endpoint(self.internal)
    }

    /// Handle to the bucket `name`. Bucket names are lowercased.
    pub fn bucket(&self, name: &str) -> Bucket {
        Bucket::new(self.clone(), name.to_lowercase())
    }

    /// List all buckets owned by the account.
    pub async fn get_service(&self) -> Result<GetServiceResp> {
        let body = self.bucket("").get("").await?;
        Ok(quick_xml::de::from_reader(body.as_ref())?)
    }

    pub(crate) fn credential(&self) -> &Credential {
        &self.credential
    }

    pub(crate) fn resolve(&self, req: Request) -> Result<ResolvedRequest> {
        req.resolve(&self.endpoint())
    }

    /// Sign and send one attempt of `req`.
    ///
    /// Every error carries the method of the request so the retry
    /// classifier can tell idempotent verbs apart.
    pub(crate) async fn run(&self, req: &ResolvedRequest) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let signed = req.sign(&self.credential, now())?;
        debug!("sending OSS request: {} {}", method, signed.uri());

        let resp = self
            .ctx
            .http_send(signed.into_http()?)
            .await
            .map_err(|e| e.with_method(method.clone()))?;
        debug!("OSS responded with status {}", resp.status());

        match resp.status() {
            StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::PARTIAL_CONTENT => Ok(resp),
            _ => Err(build_error(resp).with_method(method)),
        }
    }

    /// Run `req` once and decode the XML body into `T`.
    pub(crate) async fn query<T: DeserializeOwned>(&self, req: &ResolvedRequest) -> Result<T> {
        let resp = self.run(req).await?;
        Ok(quick_xml::de::from_reader(resp.body().as_ref())?)
    }

    /// Call `f` until it succeeds, fails with an error not worth retrying,
    /// or the attempt strategy runs out.
    pub(crate) async fn retry<T, F, Fut>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = self.retry.start();
        while attempt.next().await {
            match f().await {
                Err(err) if should_retry(&err) && attempt.has_next() => {
                    warn!(
                        "OSS request attempt {} failed, retrying: {err}",
                        attempt.count()
                    );
                }
                res => return res,
            }
        }
        Err(Error::unexpected("OSS currently unreachable"))
    }
}

/// Turn a failed response into a service error.
///
/// The message falls back to the status line when the body carries none.
fn build_error(resp: http::Response<Bytes>) -> Error {
    let status = resp.status();
    let body = resp.into_body();

    let mut err = if body.is_empty() {
        ServiceError::default()
    } else {
        quick_xml::de::from_reader::<_, ServiceError>(body.as_ref()).unwrap_or_else(|e| {
            debug!("failed to decode OSS error body: {e}");
            ServiceError::default()
        })
    };
    err.status_code = status;
    if err.message.is_empty() {
        err.message = status_line(status);
    }

    debug!("OSS error: {err:?}");
    Error::service(err)
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}
