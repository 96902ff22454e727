use std::time::Duration;

use super::constants::*;
use crate::Region;
use alioss_core::{AttemptStrategy, Context};

/// Config carries all the configuration of an OSS [`crate::Client`].
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
    /// `region` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_OSS_REGION`]
    /// - default to [`Region::Hangzhou`]
    pub region: Option<Region>,
    /// `internal` selects the internal endpoint of the region. It will be
    /// loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_OSS_INTERNAL`], `true` or `1` enables it
    /// - default to `false`
    pub internal: Option<bool>,
    /// Timeout for establishing a connection.
    pub connect_timeout: Option<Duration>,
    /// Deadline for a whole request, counted from when it is sent.
    pub read_timeout: Option<Duration>,
    /// Retry policy applied to idempotent operations.
    pub retry: AttemptStrategy,
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_SECRET) {
            self.access_key_secret.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_OSS_REGION) {
            self.region.get_or_insert(Region::from(v.as_str()));
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_OSS_INTERNAL) {
            self.internal
                .get_or_insert(v.eq_ignore_ascii_case("true") || v == "1");
        }

        self
    }

    /// Set the access key pair.
    pub fn with_credential(mut self, access_key_id: &str, access_key_secret: &str) -> Self {
        self.access_key_id = Some(access_key_id.to_string());
        self.access_key_secret = Some(access_key_secret.to_string());
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Choose between the internal and the public endpoint.
    pub fn with_internal(mut self, internal: bool) -> Self {
        self.internal = Some(internal);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: AttemptStrategy) -> Self {
        self.retry = retry;
        self
    }
}
