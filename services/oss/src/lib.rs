//! Aliyun OSS client.
//!
//! This crate exposes the Object Storage Service REST API as typed async
//! calls: every request is addressed from a region, signed with HMAC-SHA1,
//! sent over [`reqwest`](alioss_http_send_reqwest::ReqwestHttpSend) and, for
//! idempotent operations, retried on transient failures.
//!
//! ## Quick Start
//!
//! ```no_run
//! use alioss::{Acl, Client, Config, Options, Region};
//!
//! #[tokio::main]
//! async fn main() -> alioss_core::Result<()> {
//!     let config = Config::default()
//!         .with_credential("your-access-key-id", "your-access-key-secret")
//!         .with_region(Region::Beijing);
//!     let client = Client::new(config)?;
//!
//!     let bucket = client.bucket("examplebucket");
//!     bucket
//!         .put("hello.txt", "Hello, OSS!", "text/plain", Acl::Private, &Options::default())
//!         .await?;
//!     assert!(bucket.exists("hello.txt").await?);
//!
//!     let content = bucket.get("hello.txt").await?;
//!     println!("{}", String::from_utf8_lossy(&content));
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Values missing from [`Config`] are read from the environment:
//!
//! ```bash
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! export ALIBABA_CLOUD_OSS_REGION=oss-cn-beijing
//! export ALIBABA_CLOUD_OSS_INTERNAL=true  # Optional, use the VPC endpoint
//! ```
//!
//! ## Retries
//!
//! Reads, existence checks, listings and bucket removal are retried under
//! the client's [`AttemptStrategy`](alioss_core::AttemptStrategy) when the
//! failure is transient. Uploads, copies and deletes of objects are issued
//! once.
//!
//! ## Delegated access
//!
//! [`Bucket::signed_url`] and [`Bucket::upload_signed_url`] build URLs that
//! work without credentials until they expire. [`Bucket::post_form_args`]
//! builds the fields of an HTML form for direct browser uploads.

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod region;
pub use region::Region;

mod request;
pub use request::Params;

mod sign_request;

mod presign;
pub use presign::PostForm;

mod retry;
pub use retry::should_retry;

mod types;
pub use types::*;

mod client;
pub use client::Client;

mod bucket;
pub use bucket::Bucket;
