// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::collections::HashSet;
use std::fmt::Write;

use alioss_core::hash::base64_hmac_sha1;
use alioss_core::Result;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderValue, Method};
use once_cell::sync::Lazy;

use crate::constants::*;
use crate::request::{has_sub_resource_marker, Params};
use crate::Credential;

/// RequestSigner computes the OSS signature of one request attempt.
///
/// Requests whose params carry `OSSAccessKeyId` are signed in query form:
/// the date slot holds `Expires` and `Signature` is added to the params.
/// All others get an `Authorization` header.
#[derive(Debug)]
pub(crate) struct RequestSigner<'a> {
    cred: &'a Credential,
}

impl<'a> RequestSigner<'a> {
    pub fn new(cred: &'a Credential) -> Self {
        Self { cred }
    }

    /// Sign the request described by `path`, `params` and `headers` in place.
    ///
    /// `path` is the resolved path, bucket prefix included.
    pub fn sign(
        &self,
        method: &Method,
        bucket: &str,
        path: &str,
        params: &mut Params,
        headers: &mut HeaderMap,
    ) -> Result<()> {
        let string_to_sign = build_string_to_sign(method, bucket, path, params, headers)?;
        let signature = base64_hmac_sha1(
            self.cred.access_key_secret.as_bytes(),
            string_to_sign.as_bytes(),
        );

        if params.contains_key(OSS_ACCESS_KEY_ID) {
            params.insert(SIGNATURE.to_string(), vec![signature]);
        } else {
            let mut value: HeaderValue =
                format!("OSS {}:{}", self.cred.access_key_id, signature).parse()?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(())
    }
}

/// Build the canonical string of a request.
pub(crate) fn build_string_to_sign(
    method: &Method,
    bucket: &str,
    path: &str,
    params: &Params,
    headers: &HeaderMap,
) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", method.as_str())?;
    writeln!(&mut s, "{}", header_str(headers, CONTENT_MD5))?;
    writeln!(&mut s, "{}", header_str(headers, CONTENT_TYPE.as_str()))?;

    match params.get(EXPIRES).and_then(|v| v.first()) {
        Some(expires) if params.contains_key(OSS_ACCESS_KEY_ID) => writeln!(&mut s, "{expires}")?,
        _ => writeln!(&mut s, "{}", header_str(headers, DATE.as_str()))?,
    }

    s.write_str(&canonicalize_headers(headers))?;
    s.write_str(&canonicalize_resource(bucket, path, params))?;
    Ok(s)
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> &'h str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Sorted `x-oss-*` headers, one `name:value\n` line each.
///
/// Repeated headers have their values joined by `,`.
fn canonicalize_headers(headers: &HeaderMap) -> String {
    let mut oss_headers: Vec<(&str, String)> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(X_OSS_PREFIX))
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect::<Vec<_>>()
                .join(",");
            (name.as_str(), values)
        })
        .collect();
    oss_headers.sort_by(|a, b| a.0.cmp(b.0));

    let mut s = String::new();
    for (name, value) in oss_headers {
        s.push_str(name);
        s.push(':');
        s.push_str(&value);
        s.push('\n');
    }
    s
}

/// The resolved path followed by the sub-resource params present.
///
/// A literal `?subresource` right after the bucket is kept as-is and
/// further sub-resources are appended with `&`. A `?` anywhere else is part
/// of the object key.
fn canonicalize_resource(bucket: &str, path: &str, params: &Params) -> String {
    let mut resource = path.to_string();
    if !bucket.is_empty() && path.strip_prefix('/') == Some(bucket) {
        resource.push('/');
    }

    let mut sep = if has_sub_resource_marker(path) { '&' } else { '?' };
    for (k, vs) in params {
        if !is_sub_resource(k) {
            continue;
        }
        for v in vs {
            resource.push(sep);
            resource.push_str(k);
            if !v.is_empty() {
                resource.push('=');
                resource.push_str(v);
            }
            sep = '&';
        }
    }
    resource
}

fn is_sub_resource(key: &str) -> bool {
    SUB_RESOURCES.contains(key)
}

/// Query parameters that take part in the canonical resource.
static SUB_RESOURCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "acl",
        "append",
        "bucketInfo",
        "cname",
        "comp",
        "cors",
        "delete",
        "lifecycle",
        "location",
        "logging",
        "objectMeta",
        "partNumber",
        "policy",
        "position",
        "referer",
        "replication",
        "replicationLocation",
        "replicationProgress",
        "response-cache-control",
        "response-content-disposition",
        "response-content-encoding",
        "response-content-language",
        "response-content-type",
        "response-expires",
        "restore",
        "security-token",
        "stat",
        "status",
        "symlink",
        "tagging",
        "uploadId",
        "uploads",
        "versionId",
        "versioning",
        "versions",
        "website",
        "x-oss-process",
    ])
});
