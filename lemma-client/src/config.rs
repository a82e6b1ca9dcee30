use crate::client::DEFAULT_ENDPOINT;
use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Settings for a [`Lemmatizer`](crate::Lemmatizer).
///
/// Each lemmatizer owns its own copy, so independent lemmatizers (and their
/// caches) never share state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LemmatizerConfig {
    /// Number of words resolved concurrently
    pub concurrency: usize,
    /// Maximum number of cached lemmas
    pub cache_capacity: usize,
    /// Lookup URL; the percent-encoded word is appended to it
    pub endpoint: String,
    /// What to do when a lookup fails
    pub retry: RetryPolicy,
    /// Emit per-word diagnostics
    pub verbose: bool,
}

impl Default for LemmatizerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            cache_capacity: 10000,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
            verbose: false,
        }
    }
}

impl LemmatizerConfig {
    /// Build a configuration from user-supplied (possibly negative) numbers.
    pub fn new(concurrency: i64, cache_capacity: i64) -> Result<Self, ConfigError> {
        let config = Self {
            concurrency: usize::try_from(concurrency)
                .map_err(|_| ConfigError::InvalidConcurrency(concurrency))?,
            cache_capacity: usize::try_from(cache_capacity)
                .map_err(|_| ConfigError::InvalidCacheCapacity(cache_capacity))?,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        self.endpoint = endpoint.into();
        self.validate()?;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Result<Self, ConfigError> {
        self.retry = retry;
        self.validate()?;
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidCacheCapacity(0));
        }

        let url = url::Url::parse(&self.endpoint).map_err(|err| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        self.retry.validate()
    }
}
