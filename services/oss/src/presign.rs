//! Credentials for requests issued by someone else: upload URLs and
//! browser form uploads.

use std::collections::BTreeMap;

use alioss_core::hash::{base64_encode, base64_hmac_sha1};
use alioss_core::time::{format_iso8601, DateTime};
use alioss_core::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::constants::*;
use crate::request::escape_path;
use crate::Credential;

/// Canonical string of an upload URL.
///
/// Any method other than `POST` is signed as `PUT`.
pub(crate) fn upload_string_to_sign(
    method: &str,
    content_type: &str,
    expires: i64,
    bucket: &str,
    name: &str,
) -> String {
    let method = if method == "POST" { "POST" } else { "PUT" };
    let name = name.trim_start_matches('/');
    format!("{method}\n\n{content_type}\n{expires}\n/{bucket}/{name}")
}

/// Build a self-contained URL that lets its holder upload `name` until
/// `expires`.
pub(crate) fn upload_signed_url(
    cred: &Credential,
    host: &str,
    bucket: &str,
    name: &str,
    method: &str,
    content_type: &str,
    expires: DateTime,
) -> String {
    let expires = expires.timestamp();
    let string_to_sign = upload_string_to_sign(method, content_type, expires, bucket, name);
    let signature = base64_hmac_sha1(
        cred.access_key_secret.as_bytes(),
        string_to_sign.as_bytes(),
    );

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(EXPIRES, &expires.to_string())
        .append_pair(OSS_ACCESS_KEY_ID, &cred.access_key_id)
        .append_pair(SIGNATURE, &signature)
        .finish();
    format!(
        "https://{bucket}.{host}/{}?{query}",
        escape_path(name.trim_start_matches('/'))
    )
}

/// PostForm holds what a browser needs to upload an object directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    /// URL the form is posted to.
    pub action: String,
    /// Hidden input fields of the form.
    pub fields: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct Policy {
    expiration: String,
    conditions: Vec<Value>,
}

/// Build the policy document and the fields of a form upload.
///
/// `conditions` are placed ahead of the `key` and `bucket` conditions
/// the policy always carries.
pub(crate) fn post_form(
    cred: &Credential,
    endpoint: &str,
    bucket: &str,
    path: &str,
    expires: DateTime,
    redirect: &str,
    conditions: Vec<Value>,
) -> Result<PostForm> {
    let mut fields = BTreeMap::from([
        (OSS_ACCESS_KEY_ID.to_string(), cred.access_key_id.clone()),
        ("key".to_string(), path.to_string()),
    ]);

    let mut conditions = conditions;
    conditions.push(json!({ "key": path }));
    conditions.push(json!({ "bucket": bucket }));
    if !redirect.is_empty() {
        conditions.push(json!({ "success_action_redirect": redirect }));
        fields.insert("success_action_redirect".to_string(), redirect.to_string());
    }

    let policy = serde_json::to_vec(&Policy {
        expiration: format_iso8601(expires),
        conditions,
    })
    .map_err(|e| {
        Error::request_invalid(format!("failed to encode post policy: {e}"))
            .with_source(e)
    })?;
    let policy = base64_encode(&policy);
    let signature = base64_hmac_sha1(cred.access_key_secret.as_bytes(), policy.as_bytes());
    fields.insert("policy".to_string(), policy);
    fields.insert("signature".to_string(), signature);

    Ok(PostForm {
        action: format!("{endpoint}/{bucket}/"),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn cred() -> Credential {
        Credential::new("access_key_id", "access_key_secret")
    }

    #[test_case("GET", "PUT"; "get becomes put")]
    #[test_case("PUT", "PUT"; "put kept")]
    #[test_case("POST", "POST"; "post kept")]
    fn test_upload_string_to_sign_method(method: &str, expected: &str) {
        let s = upload_string_to_sign(method, "image/png", 1700000000, "bucket", "images/a.png");
        assert_eq!(
            s,
            format!("{expected}\n\nimage/png\n1700000000\n/bucket/images/a.png")
        );
    }

    #[test]
    fn test_upload_signed_url_is_deterministic() {
        let expires = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let build = || {
            upload_signed_url(
                &cred(),
                "oss-cn-hangzhou.aliyuncs.com",
                "bucket",
                "images/ali 1.png",
                "PUT",
                "image/png",
                expires,
            )
        };

        let url = build();
        assert_eq!(url, build());

        let signature = base64_hmac_sha1(
            b"access_key_secret",
            b"PUT\n\nimage/png\n1700000000\n/bucket/images/ali 1.png",
        );
        let expected_query = form_urlencoded::Serializer::new(String::new())
            .append_pair("Expires", "1700000000")
            .append_pair("OSSAccessKeyId", "access_key_id")
            .append_pair("Signature", &signature)
            .finish();
        assert_eq!(
            url,
            format!(
                "https://bucket.oss-cn-hangzhou.aliyuncs.com/images/ali%201.png?{expected_query}"
            )
        );
    }

    #[test]
    fn test_post_form() {
        let expires = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let form = post_form(
            &cred(),
            "http://oss-cn-hangzhou.aliyuncs.com",
            "bucket",
            "uploads/a.txt",
            expires,
            "https://example.com/done",
            vec![json!(["content-length-range", 0, 1024])],
        )
        .unwrap();

        assert_eq!(form.action, "http://oss-cn-hangzhou.aliyuncs.com/bucket/");
        assert_eq!(form.fields["key"], "uploads/a.txt");
        assert_eq!(form.fields["OSSAccessKeyId"], "access_key_id");
        assert_eq!(form.fields["success_action_redirect"], "https://example.com/done");

        let policy = BASE64_STANDARD.decode(&form.fields["policy"]).unwrap();
        assert_eq!(
            String::from_utf8(policy).unwrap(),
            r#"{"expiration":"2024-01-01T00:00:00Z","conditions":[["content-length-range",0,1024],{"key":"uploads/a.txt"},{"bucket":"bucket"},{"success_action_redirect":"https://example.com/done"}]}"#
        );
        assert_eq!(
            form.fields["signature"],
            base64_hmac_sha1(b"access_key_secret", form.fields["policy"].as_bytes())
        );
    }

    #[test]
    fn test_post_form_without_redirect() {
        let expires = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let form = post_form(
            &cred(),
            "http://oss-cn-hangzhou.aliyuncs.com",
            "bucket",
            "a.txt",
            expires,
            "",
            Vec::new(),
        )
        .unwrap();

        assert!(!form.fields.contains_key("success_action_redirect"));
        assert_eq!(form.fields.len(), 4);
    }
}
