use std::collections::BTreeMap;

use alioss_core::time::{format_http_date, DateTime};
use alioss_core::{Error, Result};
use bytes::Bytes;
use http::header::DATE;
use http::{HeaderMap, Method, Uri};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::sign_request::RequestSigner;
use crate::Credential;

/// Query parameters of a request: key to values, ordered by key.
pub type Params = BTreeMap<String, Vec<String>>;

/// Characters left as-is in a request path, matching RFC 3986 path rules.
static PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b',')
    .remove(b'/')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// Request is a logical OSS operation that has not been addressed yet.
#[derive(Debug, Default)]
pub(crate) struct Request {
    pub method: Method,
    pub bucket: String,
    pub path: String,
    pub params: Params,
    pub headers: HeaderMap,
    pub payload: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, bucket: &str, path: &str) -> Self {
        Self {
            method,
            bucket: bucket.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Address the request against `endpoint`.
    ///
    /// The draft is consumed: the base URL and the bucket prefix are derived
    /// exactly once per logical request.
    pub fn resolve(self, endpoint: &str) -> Result<ResolvedRequest> {
        let base: Uri = endpoint.parse().map_err(|e| {
            Error::config_invalid(format!("bad OSS endpoint URL {endpoint:?}: {e}")).with_source(e)
        })?;
        let (Some(scheme), Some(authority)) = (base.scheme(), base.authority()) else {
            return Err(Error::config_invalid(format!(
                "bad OSS endpoint URL {endpoint:?}: scheme and host are required"
            )));
        };
        let base_url = format!("{scheme}://{authority}");

        let mut path = self.path;
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        if !self.bucket.is_empty() {
            path = if path == "/" {
                format!("/{}", self.bucket)
            } else {
                format!("/{}{}", self.bucket, path)
            };
        }

        Ok(ResolvedRequest {
            method: self.method,
            bucket: self.bucket,
            base_url,
            path,
            params: self.params,
            headers: self.headers,
            payload: self.payload.unwrap_or_default(),
        })
    }
}

/// ResolvedRequest is fully addressed and can be signed once per attempt.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedRequest {
    method: Method,
    bucket: String,
    base_url: String,
    path: String,
    params: Params,
    headers: HeaderMap,
    payload: Bytes,
}

impl ResolvedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// URL of this request without any query.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, partially_escaped_path(&self.path))
    }

    /// Stamp `Date` with `now` and sign a fresh copy of headers and params.
    pub fn sign(&self, cred: &Credential, now: DateTime) -> Result<SignedRequest> {
        let mut headers = self.headers.clone();
        let mut params = self.params.clone();

        headers.insert(DATE, format_http_date(now).parse()?);
        RequestSigner::new(cred).sign(
            &self.method,
            &self.bucket,
            &self.path,
            &mut params,
            &mut headers,
        )?;

        Ok(SignedRequest {
            method: self.method.clone(),
            uri: build_uri(&self.base_url, &self.path, &params),
            headers,
            payload: self.payload.clone(),
        })
    }
}

/// SignedRequest is ready to be handed to the transport.
#[derive(Debug)]
pub(crate) struct SignedRequest {
    method: Method,
    uri: String,
    headers: HeaderMap,
    payload: Bytes,
}

impl SignedRequest {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn into_http(self) -> Result<http::Request<Bytes>> {
        let mut req = http::Request::new(self.payload);
        *req.method_mut() = self.method;
        *req.uri_mut() = self.uri.parse()?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

/// Escape `path` for the request line.
///
/// Some bucket operations (acl, location, website, ...) need the first
/// character after the bucket name to be a literal `?` instead of `%3F`.
/// That one `?` is kept; everything else, `+` included, is escaped.
pub(crate) fn partially_escaped_path(path: &str) -> String {
    let escaped = escape_path(path);
    let mut segments: Vec<String> = escaped.split('/').map(str::to_string).collect();
    if segments.len() >= 3 {
        if let Some(rest) = segments[2].strip_prefix("%3F") {
            segments[2] = format!("?{rest}");
        }
    }
    segments.join("/")
}

/// Report whether `path` carries a sub-resource marker: a `?` opening the
/// segment right after the bucket name. This is the only `?` that
/// [`partially_escaped_path`] leaves unescaped.
pub(crate) fn has_sub_resource_marker(path: &str) -> bool {
    path.split('/').nth(2).is_some_and(|seg| seg.starts_with('?'))
}

/// Percent-encode every character not allowed verbatim in a path.
pub(crate) fn escape_path(path: &str) -> String {
    utf8_percent_encode(path, &PATH_ENCODE_SET).to_string()
}

/// Encode params as a query string, sorted by key.
///
/// Empty values are written as a bare key, the form OSS uses for
/// sub-resources like `?acl`.
pub(crate) fn encode_query(params: &Params) -> String {
    let mut s = String::new();
    for (k, vs) in params {
        for v in vs {
            if !s.is_empty() {
                s.push('&');
            }
            s.extend(form_urlencoded::byte_serialize(k.as_bytes()));
            if !v.is_empty() {
                s.push('=');
                s.extend(form_urlencoded::byte_serialize(v.as_bytes()));
            }
        }
    }
    s
}

fn build_uri(base_url: &str, path: &str, params: &Params) -> String {
    let mut uri = format!("{base_url}{}", partially_escaped_path(path));
    let query = encode_query(params);
    if !query.is_empty() {
        uri.push(if has_sub_resource_marker(path) { '&' } else { '?' });
        uri.push_str(&query);
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::ErrorKind;
    use chrono::TimeZone;
    use chrono::Utc;
    use http::header::AUTHORIZATION;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const ENDPOINT: &str = "http://oss-cn-hangzhou.aliyuncs.com";

    fn cred() -> Credential {
        Credential::new("access_key_id", "access_key_secret")
    }

    #[test_case("bucket", "", "/bucket"; "bucket root from empty path")]
    #[test_case("bucket", "/", "/bucket"; "bucket root")]
    #[test_case("bucket", "photos/a.jpg", "/bucket/photos/a.jpg"; "relative path")]
    #[test_case("bucket", "/photos/a.jpg", "/bucket/photos/a.jpg"; "absolute path")]
    #[test_case("bucket", "/?acl", "/bucket/?acl"; "bucket sub-resource")]
    #[test_case("", "", "/"; "service root")]
    fn test_resolve_path(bucket: &str, path: &str, expected: &str) {
        let req = Request::new(Method::GET, bucket, path)
            .resolve(ENDPOINT)
            .expect("must resolve");
        assert_eq!(req.path(), expected);
        assert_eq!(req.base_url(), ENDPOINT);
    }

    #[test]
    fn test_resolve_rejects_bad_endpoint() {
        let err = Request::new(Method::GET, "bucket", "a")
            .resolve("http://bad host.aliyuncs.com")
            .expect_err("endpoint must be rejected");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Request::new(Method::GET, "bucket", "a")
            .resolve("/just/a/path")
            .expect_err("endpoint must be rejected");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_sign_is_repeatable_and_refreshes_date() {
        let req = Request::new(Method::GET, "bucket", "object.txt")
            .with_params(Params::from([("acl".to_string(), vec![String::new()])]))
            .resolve(ENDPOINT)
            .expect("must resolve");

        let t1 = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 9).unwrap();
        let first = req.sign(&cred(), t1).expect("must sign");
        let second = req.sign(&cred(), t2).expect("must sign");

        // Addressing happened once; signing again changes neither.
        assert_eq!(req.path(), "/bucket/object.txt");
        assert_eq!(req.base_url(), ENDPOINT);
        assert_eq!(first.uri(), second.uri());
        assert_eq!(
            first.uri(),
            "http://oss-cn-hangzhou.aliyuncs.com/bucket/object.txt?acl"
        );

        assert_eq!(first.headers()[DATE], "Tue, 02 Jan 2024 03:04:05 GMT");
        assert_eq!(second.headers()[DATE], "Tue, 02 Jan 2024 03:04:09 GMT");
        assert_ne!(first.headers()[AUTHORIZATION], second.headers()[AUTHORIZATION]);
    }

    #[test]
    fn test_sign_does_not_mutate_resolved_request() {
        let req = Request::new(Method::PUT, "bucket", "object.txt")
            .resolve(ENDPOINT)
            .expect("must resolve");
        let _ = req.sign(&cred(), Utc::now()).expect("must sign");
        let _ = req.sign(&cred(), Utc::now()).expect("must sign");

        assert!(req.headers.is_empty());
        assert!(req.params.is_empty());
    }

    #[test_case("/bucket/?acl", "/bucket/?acl"; "sub-resource marker kept")]
    #[test_case("/bucket/?location", "/bucket/?location"; "location kept")]
    #[test_case("/bucket/a?b", "/bucket/a%3Fb"; "question mark inside key escaped")]
    #[test_case("/bucket/dir/?acl", "/bucket/dir/%3Facl"; "deeper question mark escaped")]
    #[test_case("/bucket/a b+c", "/bucket/a%20b%2Bc"; "space and plus escaped")]
    #[test_case("/bucket/ä#%", "/bucket/%C3%A4%23%25"; "unicode and reserved escaped")]
    #[test_case("/bucket/a=b&c:d@e", "/bucket/a=b&c:d@e"; "path safe characters kept")]
    #[test_case("/", "/"; "root")]
    fn test_partially_escaped_path(input: &str, expected: &str) {
        assert_eq!(partially_escaped_path(input), expected);
    }

    #[test_case("/bucket/?acl", true; "marker after bucket")]
    #[test_case("/bucket/a?b", false; "question mark inside key")]
    #[test_case("/bucket/dir/?acl", false; "question mark in deeper segment")]
    #[test_case("/bucket", false; "bucket root")]
    #[test_case("/", false; "service root")]
    fn test_has_sub_resource_marker(path: &str, expected: bool) {
        assert_eq!(has_sub_resource_marker(path), expected);
    }

    #[test]
    fn test_encode_query() {
        let params = Params::from([
            ("prefix".to_string(), vec!["photos/2006 jan".to_string()]),
            ("delimiter".to_string(), vec!["/".to_string()]),
            ("acl".to_string(), vec![String::new()]),
            ("marker".to_string(), vec![String::new()]),
        ]);

        assert_eq!(
            encode_query(&params),
            "acl&delimiter=%2F&marker&prefix=photos%2F2006+jan"
        );
    }

    #[test]
    fn test_build_uri_appends_to_literal_marker() {
        let params = Params::from([("max-keys".to_string(), vec!["10".to_string()])]);
        assert_eq!(
            build_uri(ENDPOINT, "/bucket/?acl", &params),
            "http://oss-cn-hangzhou.aliyuncs.com/bucket/?acl&max-keys=10"
        );
    }

    #[test]
    fn test_build_uri_with_question_mark_in_key() {
        let params = Params::from([(
            "response-content-type".to_string(),
            vec!["text/plain".to_string()],
        )]);
        assert_eq!(
            build_uri(ENDPOINT, "/bucket/dir/a?b", &params),
            "http://oss-cn-hangzhou.aliyuncs.com/bucket/dir/a%3Fb?response-content-type=text%2Fplain"
        );
    }
}
