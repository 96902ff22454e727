use std::io::Cursor;
use std::path::Path;

use alioss_core::hash::base64_md5;
use alioss_core::time::{now, DateTime};
use alioss_core::{Error, Result};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants::*;
use crate::presign::{self, PostForm};
use crate::request::{Params, Request};
use crate::types::*;
use crate::{Client, Region};

/// Bucket runs object and bucket operations against one bucket.
#[derive(Clone, Debug)]
pub struct Bucket {
    client: Client,
    name: String,
}

impl Bucket {
    pub(crate) fn new(client: Client, name: String) -> Self {
        Self { client, name }
    }

    /// Bucket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn request(&self, method: Method, path: &str) -> Request {
        Request::new(method, &self.name, path)
    }

    /// Create the bucket in the client's region.
    ///
    /// Not retried.
    pub async fn put_bucket(&self, acl: Acl) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(X_OSS_ACL, HeaderValue::from_static(acl.as_str()));
        let body = format!(
            "<CreateBucketConfiguration>\n  <LocationConstraint>{}</LocationConstraint>\n</CreateBucketConfiguration>",
            self.client.region()
        );

        let req = self.client.resolve(
            self.request(Method::PUT, "/")
                .with_headers(headers)
                .with_payload(Bytes::from(body)),
        )?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// Remove the bucket. It must be empty.
    pub async fn delete_bucket(&self) -> Result<()> {
        let req = &self.client.resolve(self.request(Method::DELETE, "/"))?;
        self.client
            .retry(move || async move { self.client.run(req).await.map(|_| ()) })
            .await
    }

    /// Fetch the content of the object at `path`.
    pub async fn get(&self, path: &str) -> Result<Bytes> {
        Ok(self.get_response(path).await?.into_body())
    }

    /// Fetch the object at `path` as an async reader over its content.
    pub async fn get_reader(&self, path: &str) -> Result<impl AsyncRead + Unpin + Send> {
        Ok(Cursor::new(self.get(path).await?))
    }

    /// Fetch the object at `path` with its response headers.
    pub async fn get_response(&self, path: &str) -> Result<http::Response<Bytes>> {
        self.get_response_with_headers(path, HeaderMap::new()).await
    }

    /// Fetch the object at `path`, sending extra request `headers` such as
    /// `Range`.
    pub async fn get_response_with_headers(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<http::Response<Bytes>> {
        let req = &self
            .client
            .resolve(self.request(Method::GET, path).with_headers(headers))?;
        self.client.retry(move || self.client.run(req)).await
    }

    /// Check whether an object exists with a HEAD request.
    ///
    /// A 403 or 404 answer means the object does not exist and is not
    /// treated as a failure.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let req = &self.client.resolve(self.request(Method::HEAD, path))?;
        self.client
            .retry(move || async move {
                match self.client.run(req).await {
                    Ok(resp) => Ok(resp.status().is_success()),
                    Err(err)
                        if matches!(
                            err.status_code(),
                            Some(StatusCode::FORBIDDEN | StatusCode::NOT_FOUND)
                        ) =>
                    {
                        Ok(false)
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }

    /// HEAD the object at `path`.
    pub async fn head(&self, path: &str, headers: HeaderMap) -> Result<http::Response<Bytes>> {
        let req = &self
            .client
            .resolve(self.request(Method::HEAD, path).with_headers(headers))?;
        self.client.retry(move || self.client.run(req)).await
    }

    /// Store `data` at `path`.
    ///
    /// Not retried.
    pub async fn put(
        &self,
        path: &str,
        data: impl Into<Bytes>,
        content_type: &str,
        acl: Acl,
        options: &Options,
    ) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, content_type.parse()?);
        headers.insert(X_OSS_ACL, HeaderValue::from_static(acl.as_str()));
        options.add_headers(&mut headers)?;

        let req = self.client.resolve(
            self.request(Method::PUT, path)
                .with_headers(headers)
                .with_payload(data.into()),
        )?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// Store `length` bytes read from `reader` at `path`.
    ///
    /// The reader must end after exactly `length` bytes. Not retried.
    pub async fn put_reader(
        &self,
        path: &str,
        reader: impl AsyncRead + Unpin,
        length: u64,
        content_type: &str,
        acl: Acl,
        options: &Options,
    ) -> Result<()> {
        let mut data = Vec::new();
        // One extra byte tells an overlong reader apart from an exact one.
        reader
            .take(length.saturating_add(1))
            .read_to_end(&mut data)
            .await
            .map_err(|e| {
                Error::request_invalid(format!("failed to read content of {path}: {e}"))
                    .with_source(e)
            })?;
        if data.len() as u64 != length {
            return Err(Error::request_invalid(format!(
                "content of {path} does not match the declared length of {length} bytes"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        headers.insert(CONTENT_TYPE, content_type.parse()?);
        headers.insert(X_OSS_ACL, HeaderValue::from_static(acl.as_str()));
        options.add_headers(&mut headers)?;

        let req = self.client.resolve(
            self.request(Method::PUT, path)
                .with_headers(headers)
                .with_payload(Bytes::from(data)),
        )?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// Store the content of the local file `file` at `path`.
    ///
    /// The content type is derived from the file extension.
    pub async fn put_file(
        &self,
        path: &str,
        file: impl AsRef<Path>,
        acl: Acl,
        options: &Options,
    ) -> Result<()> {
        let file = file.as_ref();
        let data = tokio::fs::read(file).await.map_err(|e| {
            Error::request_invalid(format!("failed to read {}: {e}", file.display()))
                .with_source(e)
        })?;
        self.put(path, data, content_type_of(file), acl, options)
            .await
    }

    /// Copy the object `source` (`/<bucket>/<key>`) to `path` in this bucket.
    ///
    /// Not retried.
    pub async fn put_copy(
        &self,
        path: &str,
        acl: Acl,
        options: &CopyOptions,
        source: &str,
    ) -> Result<CopyObjectResult> {
        let mut headers = HeaderMap::new();
        headers.insert(X_OSS_ACL, HeaderValue::from_static(acl.as_str()));
        headers.insert(X_OSS_COPY_SOURCE, source.parse()?);
        options.add_headers(&mut headers)?;

        let req = self
            .client
            .resolve(self.request(Method::PUT, path).with_headers(headers))?;
        self.client.query(&req).await
    }

    /// Configure the bucket as a static website.
    pub async fn put_bucket_website(&self, config: &WebsiteConfiguration) -> Result<()> {
        self.put_bucket_subresource("website", config.to_xml()?)
            .await
    }

    /// PUT `body` to the bucket sub-resource `subresource`, for example
    /// `website` or `lifecycle`.
    ///
    /// Not retried.
    pub async fn put_bucket_subresource(&self, subresource: &str, body: Bytes) -> Result<()> {
        let params = Params::from([(subresource.to_string(), vec![String::new()])]);
        let req = self.client.resolve(
            self.request(Method::PUT, "/")
                .with_params(params)
                .with_payload(body),
        )?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// Remove the object at `path`.
    ///
    /// Not retried.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let req = self.client.resolve(self.request(Method::DELETE, path))?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// Remove up to 1000 objects in one request.
    ///
    /// Issued as a POST, so never retried.
    pub async fn delete_multi(&self, objects: &Delete) -> Result<()> {
        let body = to_xml(objects)?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_MD5, base64_md5(&body).parse()?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/xml"));

        let params = Params::from([("delete".to_string(), vec![String::new()])]);
        let req = self.client.resolve(
            self.request(Method::POST, "/")
                .with_params(params)
                .with_headers(headers)
                .with_payload(body),
        )?;
        self.client.run(&req).await?;
        Ok(())
    }

    /// List objects in the bucket.
    ///
    /// `prefix` limits the result to keys starting with it. `delim` groups
    /// keys sharing a prefix up to the delimiter into
    /// [`ListResp::common_prefixes`]. `marker` is the key to list after.
    /// `max` limits the count of keys and prefixes; `0` uses the server
    /// default of 1000.
    ///
    /// When the result is truncated and OSS sends no `NextMarker`, it is set
    /// to the last returned key.
    pub async fn list(&self, prefix: &str, delim: &str, marker: &str, max: usize) -> Result<ListResp> {
        let mut params = Params::from([
            ("prefix".to_string(), vec![prefix.to_string()]),
            ("delimiter".to_string(), vec![delim.to_string()]),
            ("marker".to_string(), vec![marker.to_string()]),
        ]);
        if max != 0 {
            params.insert("max-keys".to_string(), vec![max.to_string()]);
        }

        let req = &self
            .client
            .resolve(self.request(Method::GET, "/").with_params(params))?;
        let mut resp: ListResp = self.client.retry(move || self.client.query(req)).await?;

        if resp.is_truncated && resp.next_marker.is_empty() {
            if let Some(last) = resp.contents.last() {
                resp.next_marker = last.key.clone();
            }
        }
        Ok(resp)
    }

    /// Region the bucket lives in.
    pub async fn location(&self) -> Result<String> {
        let body = self.get("/?location").await?;
        let resp: LocationConstraint = quick_xml::de::from_reader(body.as_ref())?;
        if resp.location.is_empty() {
            return Ok(Region::Hangzhou.to_string());
        }
        Ok(resp.location)
    }

    /// Access control list of the bucket.
    pub async fn acl(&self) -> Result<AccessControlPolicy> {
        let body = self.get("/?acl").await?;
        Ok(quick_xml::de::from_reader(body.as_ref())?)
    }

    /// Absolute path of `path` in this bucket: `/<bucket>/<path>`.
    pub fn path(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("/{}{path}", self.name)
        } else {
            format!("/{}/{path}", self.name)
        }
    }

    /// Unsigned URL of the object at `path`.
    ///
    /// Only usable for publicly readable objects; see [`Bucket::signed_url`].
    pub fn url(&self, path: &str) -> Result<String> {
        let req = self.client.resolve(self.request(Method::GET, path))?;
        Ok(req.url())
    }

    /// URL that lets its holder GET the object at `path` until `expires`.
    pub fn signed_url(&self, path: &str, expires: DateTime) -> Result<String> {
        self.signed_url_with_args(path, expires, Params::new(), HeaderMap::new())
    }

    /// Like [`Bucket::signed_url`], with extra query `params` and signed
    /// `headers`.
    pub fn signed_url_with_args(
        &self,
        path: &str,
        expires: DateTime,
        params: Params,
        headers: HeaderMap,
    ) -> Result<String> {
        self.signed_url_with_method(Method::GET, path, expires, params, headers)
    }

    /// URL that lets its holder send `method` to the object at `path` until
    /// `expires`.
    pub fn signed_url_with_method(
        &self,
        method: Method,
        path: &str,
        expires: DateTime,
        mut params: Params,
        headers: HeaderMap,
    ) -> Result<String> {
        params.insert(EXPIRES.to_string(), vec![expires.timestamp().to_string()]);
        params.insert(
            OSS_ACCESS_KEY_ID.to_string(),
            vec![self.client.credential().access_key_id.clone()],
        );

        let req = self.client.resolve(
            Request::new(method, &self.name, path)
                .with_params(params)
                .with_headers(headers),
        )?;
        let signed = req.sign(self.client.credential(), now())?;
        Ok(signed.uri().to_string())
    }

    /// URL that lets its holder upload `name` until `expires`.
    ///
    /// `method` is `POST` or anything else, which is signed as `PUT`.
    /// `content_type` must match the one sent with the upload.
    pub fn upload_signed_url(
        &self,
        name: &str,
        method: &str,
        content_type: &str,
        expires: DateTime,
    ) -> String {
        presign::upload_signed_url(
            self.client.credential(),
            &self.client.region().host(false),
            &self.name,
            name,
            method,
            content_type,
            expires,
        )
    }

    /// Form fields for an anonymous browser upload to `path` until `expires`.
    ///
    /// After a successful upload the browser is sent to `redirect` unless it
    /// is empty.
    pub fn post_form_args(&self, path: &str, expires: DateTime, redirect: &str) -> Result<PostForm> {
        self.post_form_args_ex(path, expires, redirect, Vec::new())
    }

    /// Like [`Bucket::post_form_args`], with extra policy `conditions`.
    pub fn post_form_args_ex(
        &self,
        path: &str,
        expires: DateTime,
        redirect: &str,
        conditions: Vec<Value>,
    ) -> Result<PostForm> {
        presign::post_form(
            self.client.credential(),
            &self.client.endpoint(),
            &self.name,
            path,
            expires,
            redirect,
            conditions,
        )
    }
}

/// Guess a content type from the extension of `file`.
fn content_type_of(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|v| v.to_str())
        .map(|v| v.to_ascii_lowercase());
    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "text/xml; charset=utf-8",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        Some("gif") => "image/gif",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
