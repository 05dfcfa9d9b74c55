//! Pipeline configuration.
//!
//! [`MediatorConfig`] is read once when the registry is built and copied into every
//! layer; it cannot change after startup.
//!
//! It can be built in code with the `with_*` methods or parsed from JSON:
//!
//! ```json
//! {
//!   "caching": true,
//!   "cache_failure": "pass_through",
//!   "default_timeout_ms": 5000
//! }
//! ```
//!
//! Every field is optional; missing fields take their [`Default`] value.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// What the caching and invalidation layers do when the cache store fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheFailurePolicy {
    /// Log the failure and continue as if the request were not cacheable (fail open).
    #[default]
    PassThrough,
    /// Fail the dispatch with [`Error::Cache`](crate::Error::Cache) (fail closed).
    Abort,
}

/// Settings shared by every chain built from one registry.
///
/// | Setting              | Default          |
/// |----------------------|------------------|
/// | `caching`            | `true`           |
/// | `cache_failure`      | `pass_through`   |
/// | `default_timeout_ms` | none             |
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediatorConfig {
    /// When `false` the caching layer forwards every request untouched.
    pub caching: bool,
    /// Behavior on cache store failures.
    pub cache_failure: CacheFailurePolicy,
    /// Deadline applied to dispatches whose token carries none. Read from
    /// `default_timeout_ms` in JSON.
    #[serde(rename = "default_timeout_ms", deserialize_with = "millis")]
    pub default_timeout: Option<Duration>,
}

fn millis<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            caching: true,
            cache_failure: CacheFailurePolicy::PassThrough,
            default_timeout: None,
        }
    }
}

impl MediatorConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) on malformed JSON, unknown
    /// fields, or values of the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enables or disables response caching.
    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching = enabled;
        self
    }

    /// Sets the cache failure policy.
    pub fn with_cache_failure(mut self, policy: CacheFailurePolicy) -> Self {
        self.cache_failure = policy;
        self
    }

    /// Sets the deadline applied to dispatches without one.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// The default dispatch timeout, if configured.
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }
}
