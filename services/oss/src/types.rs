//! Documents exchanged with OSS and the options that shape requests.

use std::collections::BTreeMap;
use std::fmt;

use alioss_core::Result;
use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_ENCODING};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::*;

/// Canned access control lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Acl {
    /// private
    Private,
    /// public-read
    PublicRead,
    /// public-read-write
    PublicReadWrite,
    /// authenticated-read
    AuthenticatedRead,
    /// bucket-owner-read
    BucketOwnerRead,
    /// bucket-owner-full-control
    BucketOwnerFull,
}

impl Acl {
    /// The value sent in `x-oss-acl`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
            Acl::PublicReadWrite => "public-read-write",
            Acl::AuthenticatedRead => "authenticated-read",
            Acl::BucketOwnerRead => "bucket-owner-read",
            Acl::BucketOwnerFull => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional headers of an object upload.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Ask OSS to encrypt the object with AES256.
    pub server_side_encryption: bool,
    /// User metadata, sent as `x-oss-meta-<name>` headers.
    pub meta: BTreeMap<String, Vec<String>>,
    /// Content-Encoding
    pub content_encoding: Option<String>,
    /// Cache-Control
    pub cache_control: Option<String>,
    /// Content-MD5
    pub content_md5: Option<String>,
    /// Content-Disposition
    pub content_disposition: Option<String>,
}

impl Options {
    pub(crate) fn add_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        if self.server_side_encryption {
            headers.insert(X_OSS_SERVER_SIDE_ENCRYPTION, HeaderValue::from_static("AES256"));
        }
        if let Some(v) = non_empty(&self.content_encoding) {
            headers.insert(CONTENT_ENCODING, v.parse()?);
        }
        if let Some(v) = non_empty(&self.cache_control) {
            headers.insert(CACHE_CONTROL, v.parse()?);
        }
        if let Some(v) = non_empty(&self.content_md5) {
            headers.insert(CONTENT_MD5, v.parse()?);
        }
        if let Some(v) = non_empty(&self.content_disposition) {
            headers.insert(CONTENT_DISPOSITION, v.parse()?);
        }

        for (k, vs) in &self.meta {
            let name: HeaderName = format!("{X_OSS_META_PREFIX}{}", k.to_lowercase()).parse()?;
            for v in vs {
                headers.append(name.clone(), v.parse()?);
            }
        }
        Ok(())
    }
}

/// Optional headers of an object copy.
#[derive(Debug, Clone, Default)]
pub struct CopyOptions {
    /// Extra headers, replacing any header of the same name.
    pub headers: HeaderMap,
    /// Byte range of the source to copy, for example `bytes=0-9`.
    pub copy_source_range: Option<String>,
    /// `COPY` or `REPLACE`.
    pub metadata_directive: Option<String>,
}

impl CopyOptions {
    pub(crate) fn add_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        if let Some(v) = non_empty(&self.metadata_directive) {
            headers.insert(X_OSS_METADATA_DIRECTIVE, v.parse()?);
        }
        if let Some(v) = non_empty(&self.copy_source_range) {
            headers.insert(X_OSS_COPY_SOURCE_RANGE, v.parse()?);
        }
        for name in self.headers.keys() {
            headers.remove(name);
            for v in self.headers.get_all(name) {
                headers.append(name.clone(), v.clone());
            }
        }
        Ok(())
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|v| !v.is_empty())
}

/// The owner of a bucket or an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Owner {
    /// Owner id.
    #[serde(rename = "ID")]
    pub id: String,
    /// Owner display name.
    #[serde(rename = "DisplayName")]
    pub display_name: String,
}

/// A bucket as listed by [`crate::Client::get_service`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Creation time as sent by OSS.
    pub creation_date: String,
}

/// All buckets owned by the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GetServiceResp {
    /// Account owner.
    pub owner: Owner,
    /// Owned buckets.
    #[serde(deserialize_with = "de_buckets")]
    pub buckets: Vec<BucketInfo>,
}

fn de_buckets<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<BucketInfo>, D::Error> {
    #[derive(Deserialize)]
    struct Buckets {
        #[serde(rename = "Bucket", default)]
        bucket: Vec<BucketInfo>,
    }
    Ok(Buckets::deserialize(d)?.bucket)
}

/// Result of a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CopyObjectResult {
    /// ETag of the new object.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Modification time as sent by OSS.
    #[serde(rename = "LastModified")]
    pub last_modified: String,
}

/// Static website hosting setup of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteConfiguration {
    /// Object served for directory requests.
    pub index_document: Option<IndexDocument>,
    /// Object served on 4xx errors.
    pub error_document: Option<ErrorDocument>,
    /// Conditional redirects.
    pub routing_rules: Option<Vec<RoutingRule>>,
    /// Redirect every request to another host.
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
}

/// Suffix appended to directory requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IndexDocument {
    /// Suffix, for example `index.html`.
    pub suffix: String,
}

/// Object served on errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorDocument {
    /// Object key.
    pub key: String,
}

/// A conditional redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoutingRule {
    /// When the rule applies.
    pub condition: RoutingCondition,
    /// Where to redirect.
    pub redirect: RoutingRedirect,
}

/// Condition of a [`RoutingRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoutingCondition {
    /// Key prefix a request must match.
    pub key_prefix_equals: String,
}

/// Target of a [`RoutingRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoutingRedirect {
    /// Replace the matched prefix with this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_key_prefix_with: Option<String>,
    /// Replace the whole key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_key_with: Option<String>,
}

/// Host every request is redirected to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RedirectAllRequestsTo {
    /// Target host.
    pub host_name: String,
    /// `http` or `https`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Body of a bucket website request, carrying the namespace OSS expects.
#[derive(Serialize)]
#[serde(rename = "WebsiteConfiguration", rename_all = "PascalCase")]
struct WebsiteDocument<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_document: Option<&'a IndexDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_document: Option<&'a ErrorDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_rules: Option<RoutingRules<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_all_requests_to: Option<&'a RedirectAllRequestsTo>,
}

#[derive(Serialize)]
struct RoutingRules<'a> {
    #[serde(rename = "RoutingRule")]
    rule: &'a [RoutingRule],
}

impl WebsiteConfiguration {
    pub(crate) fn to_xml(&self) -> Result<Bytes> {
        to_xml(&WebsiteDocument {
            xmlns: WEBSITE_XMLNS,
            index_document: self.index_document.as_ref(),
            error_document: self.error_document.as_ref(),
            routing_rules: self.routing_rules.as_deref().map(|rule| RoutingRules { rule }),
            redirect_all_requests_to: self.redirect_all_requests_to.as_ref(),
        })
    }
}

/// Objects to remove in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Delete {
    /// Only report failures.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub quiet: bool,
    /// Objects to remove.
    #[serde(rename = "Object")]
    pub objects: Vec<Object>,
}

/// One object of a [`Delete`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Object {
    /// Object key.
    pub key: String,
    /// Object version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListResp {
    /// Bucket name.
    pub name: String,
    /// Prefix the keys were filtered with.
    pub prefix: String,
    /// Delimiter keys were grouped by.
    pub delimiter: String,
    /// Marker the listing started after.
    pub marker: String,
    /// Maximum count of keys and prefixes requested.
    pub max_keys: i64,
    /// More keys are available. Pass [`ListResp::next_marker`] to continue.
    pub is_truncated: bool,
    /// Listed objects.
    pub contents: Vec<Key>,
    /// Key prefixes grouped by the delimiter.
    #[serde(deserialize_with = "de_common_prefixes")]
    pub common_prefixes: Vec<String>,
    /// Marker to continue the listing with.
    pub next_marker: String,
}

fn de_common_prefixes<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    struct CommonPrefixes {
        #[serde(rename = "Prefix", default)]
        prefix: Vec<String>,
    }
    let groups = Vec::<CommonPrefixes>::deserialize(d)?;
    Ok(groups.into_iter().flat_map(|g| g.prefix).collect())
}

/// An object stored in a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Key {
    /// Object key.
    pub key: String,
    /// Modification time as sent by OSS.
    pub last_modified: String,
    /// `Normal`, `Multipart` or `Appendable`.
    #[serde(rename = "Type")]
    pub object_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Hex MD5 of the content, surrounded by double quotes.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Storage class.
    pub storage_class: String,
    /// Object owner.
    pub owner: Owner,
}

/// Access control list of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AccessControlPolicy {
    /// Bucket owner.
    pub owner: Owner,
    /// Granted permissions.
    #[serde(rename = "AccessControlList", deserialize_with = "de_grants")]
    pub grants: Vec<String>,
}

fn de_grants<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    struct AccessControlList {
        #[serde(rename = "Grant", default)]
        grant: Vec<String>,
    }
    Ok(AccessControlList::deserialize(d)?.grant)
}

#[derive(Deserialize)]
pub(crate) struct LocationConstraint {
    #[serde(rename = "$text", default)]
    pub location: String,
}

pub(crate) fn to_xml<T: Serialize>(doc: &T) -> Result<Bytes> {
    let mut body = String::from(XML_HEADER);
    body.push_str(&quick_xml::se::to_string(doc)?);
    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_options_headers() {
        let opts = Options {
            server_side_encryption: true,
            meta: BTreeMap::from([(
                "Author".to_string(),
                vec!["alice".to_string(), "bob".to_string()],
            )]),
            cache_control: Some("no-cache".to_string()),
            content_md5: Some(String::new()),
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        opts.add_headers(&mut headers).unwrap();

        assert_eq!(headers[X_OSS_SERVER_SIDE_ENCRYPTION], "AES256");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert!(headers.get(CONTENT_MD5).is_none());
        let meta: Vec<_> = headers.get_all("x-oss-meta-author").iter().collect();
        assert_eq!(meta, vec!["alice", "bob"]);
    }

    #[test]
    fn test_copy_options_headers() {
        let mut extra = HeaderMap::new();
        extra.insert("x-oss-acl", "public-read".parse().unwrap());
        let opts = CopyOptions {
            headers: extra,
            copy_source_range: Some("bytes=0-9".to_string()),
            metadata_directive: Some("REPLACE".to_string()),
        };

        let mut headers = HeaderMap::new();
        headers.insert(X_OSS_ACL, "private".parse().unwrap());
        opts.add_headers(&mut headers).unwrap();

        assert_eq!(headers[X_OSS_METADATA_DIRECTIVE], "REPLACE");
        assert_eq!(headers[X_OSS_COPY_SOURCE_RANGE], "bytes=0-9");
        assert_eq!(headers.get_all(X_OSS_ACL).iter().count(), 1);
        assert_eq!(headers[X_OSS_ACL], "public-read");
    }

    #[test]
    fn test_list_resp_from_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>examplebucket</Name>
  <Prefix>photos/</Prefix>
  <Marker></Marker>
  <MaxKeys>2</MaxKeys>
  <Delimiter>/</Delimiter>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>photos/a.jpg</Key>
    <LastModified>2012-02-24T08:42:32.000Z</LastModified>
    <ETag>"5B3C1A2E053D763E1B002CC607C5A0FE"</ETag>
    <Type>Normal</Type>
    <Size>344606</Size>
    <StorageClass>Standard</StorageClass>
    <Owner>
      <ID>0022012</ID>
      <DisplayName>user-example</DisplayName>
    </Owner>
  </Contents>
  <CommonPrefixes>
    <Prefix>photos/2006/</Prefix>
  </CommonPrefixes>
  <CommonPrefixes>
    <Prefix>photos/2007/</Prefix>
  </CommonPrefixes>
</ListBucketResult>"#;

        let resp: ListResp = quick_xml::de::from_str(body).unwrap();
        assert_eq!(resp.name, "examplebucket");
        assert_eq!(resp.max_keys, 2);
        assert!(resp.is_truncated);
        assert_eq!(resp.contents.len(), 1);
        assert_eq!(resp.contents[0].etag, "\"5B3C1A2E053D763E1B002CC607C5A0FE\"");
        assert_eq!(resp.contents[0].size, 344606);
        assert_eq!(resp.contents[0].owner.id, "0022012");
        assert_eq!(resp.common_prefixes, vec!["photos/2006/", "photos/2007/"]);
        assert_eq!(resp.next_marker, "");
    }

    #[test]
    fn test_get_service_resp_from_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult>
  <Owner>
    <ID>512**</ID>
    <DisplayName>51264</DisplayName>
  </Owner>
  <Buckets>
    <Bucket>
      <CreationDate>2014-02-07T18:12:43.000Z</CreationDate>
      <Name>test-bucket-1</Name>
    </Bucket>
    <Bucket>
      <CreationDate>2014-02-05T11:21:04.000Z</CreationDate>
      <Name>test-bucket-2</Name>
    </Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

        let resp: GetServiceResp = quick_xml::de::from_str(body).unwrap();
        assert_eq!(resp.owner.display_name, "51264");
        assert_eq!(resp.buckets.len(), 2);
        assert_eq!(resp.buckets[1].name, "test-bucket-2");
    }

    #[test]
    fn test_acl_from_xml() {
        let body = r#"<?xml version="1.0" ?>
<AccessControlPolicy>
  <Owner>
    <ID>00220120222</ID>
    <DisplayName>user_example</DisplayName>
  </Owner>
  <AccessControlList>
    <Grant>public-read</Grant>
  </AccessControlList>
</AccessControlPolicy>"#;

        let resp: AccessControlPolicy = quick_xml::de::from_str(body).unwrap();
        assert_eq!(resp.owner.id, "00220120222");
        assert_eq!(resp.grants, vec!["public-read"]);
    }

    #[test]
    fn test_location_from_xml() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<LocationConstraint xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">oss-cn-qingdao</LocationConstraint>"#;
        let resp: LocationConstraint = quick_xml::de::from_str(body).unwrap();
        assert_eq!(resp.location, "oss-cn-qingdao");
    }

    #[test]
    fn test_delete_to_xml() {
        let doc = Delete {
            quiet: true,
            objects: vec![
                Object {
                    key: "a.txt".to_string(),
                    version_id: None,
                },
                Object {
                    key: "b.txt".to_string(),
                    version_id: Some("v1".to_string()),
                },
            ],
        };

        let body = to_xml(&doc).unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Delete><Quiet>true</Quiet>\
             <Object><Key>a.txt</Key></Object>\
             <Object><Key>b.txt</Key><VersionId>v1</VersionId></Object>\
             </Delete>"
        );
    }

    #[test]
    fn test_website_to_xml() {
        let config = WebsiteConfiguration {
            index_document: Some(IndexDocument {
                suffix: "index.html".to_string(),
            }),
            routing_rules: Some(vec![RoutingRule {
                condition: RoutingCondition {
                    key_prefix_equals: "docs/".to_string(),
                },
                redirect: RoutingRedirect {
                    replace_key_prefix_with: Some("documents/".to_string()),
                    replace_key_with: None,
                },
            }]),
            ..Default::default()
        };

        let body = config.to_xml().unwrap();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <WebsiteConfiguration xmlns=\"http://doc.oss-cn-hangzhou.aliyuncs.com\">\
             <IndexDocument><Suffix>index.html</Suffix></IndexDocument>\
             <RoutingRules><RoutingRule>\
             <Condition><KeyPrefixEquals>docs/</KeyPrefixEquals></Condition>\
             <Redirect><ReplaceKeyPrefixWith>documents/</ReplaceKeyPrefixWith></Redirect>\
             </RoutingRule></RoutingRules>\
             </WebsiteConfiguration>"
        );
    }
}
