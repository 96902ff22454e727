//! Core components shared by the alioss crates.
//!
//! ## Overview
//!
//! - [`Context`]: holds the HTTP transport ([`HttpSend`]) and environment
//!   access ([`Env`]) a client uses.
//! - [`Error`]: classified errors; the [`ErrorKind`] tells network, service,
//!   decode and configuration failures apart.
//! - [`AttemptStrategy`]: bounded retry loops driven by attempt count and
//!   elapsed time.
//!
//! ## Utilities
//!
//! - [`hash`]: HMAC-SHA1, MD5 and base64 helpers
//! - [`time`]: HTTP date formatting
//! - [`utils`]: secret redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod error;
pub use error::{Error, ErrorKind, Result, ServiceError};

mod retry;
pub use retry::{Attempt, AttemptStrategy};
