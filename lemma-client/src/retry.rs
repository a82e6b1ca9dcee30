use crate::client::LemmaLookup;
use crate::error::{ConfigError, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// How the cache loader reacts to a failed lookup.
///
/// `Forever` never gives up: a word that can't be resolved blocks its caller
/// (and with it the ordered output) until the service answers. `Limited`
/// surfaces [`Error::RetriesExhausted`] once `max_attempts` lookups have failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RetryPolicy {
    Forever {
        min_backoff_ms: u64,
        max_backoff_ms: u64,
    },
    Limited {
        max_attempts: u32,
        min_backoff_ms: u64,
        max_backoff_ms: u64,
    },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Forever {
            min_backoff_ms: 500,
            max_backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min_ms, max_ms) = self.backoff_window();
        if min_ms > max_ms {
            return Err(ConfigError::InvalidBackoff { min_ms, max_ms });
        }
        if let RetryPolicy::Limited { max_attempts: 0, .. } = self {
            return Err(ConfigError::InvalidAttemptLimit);
        }
        Ok(())
    }

    /// Delay to wait after `failed_attempts` consecutive failures, or `None`
    /// if the policy gives up.
    pub fn next_backoff(&self, failed_attempts: u32) -> Option<Duration> {
        if let RetryPolicy::Limited { max_attempts, .. } = self {
            if failed_attempts >= *max_attempts {
                return None;
            }
        }

        let (min_ms, max_ms) = self.backoff_window();
        let millis = if min_ms >= max_ms {
            min_ms
        } else {
            rand::thread_rng().gen_range(min_ms..=max_ms)
        };
        Some(Duration::from_millis(millis))
    }

    fn backoff_window(&self) -> (u64, u64) {
        match *self {
            RetryPolicy::Forever {
                min_backoff_ms,
                max_backoff_ms,
            }
            | RetryPolicy::Limited {
                min_backoff_ms,
                max_backoff_ms,
                ..
            } => (min_backoff_ms, max_backoff_ms),
        }
    }
}

/// Resolves a single word for the cache, applying the retry policy around
/// the underlying lookup.
#[derive(Clone)]
pub struct LemmaLoader {
    lookup: Arc<dyn LemmaLookup>,
    policy: RetryPolicy,
}

impl LemmaLoader {
    pub fn new(lookup: Arc<dyn LemmaLookup>, policy: RetryPolicy) -> Self {
        Self { lookup, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `Ok(None)` means the service knows no lemma for `word`.
    pub async fn load(&self, word: &str) -> Result<Option<String>, Error> {
        let mut failures = 0;
        loop {
            let err = match self.lookup.lookup(word).await {
                Ok(lemma) => return Ok(lemma),
                Err(err) => err,
            };
            failures += 1;

            match self.policy.next_backoff(failures) {
                Some(delay) => {
                    log::warn!(
                        "Error on word '{}' (attempt {}): {}. Retrying in {:?}",
                        word,
                        failures,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    log::error!("Giving up on word '{}' after {} attempts", word, failures);
                    return Err(Error::RetriesExhausted {
                        word: word.to_string(),
                        attempts: failures,
                        source: err,
                    });
                }
            }
        }
    }
}
