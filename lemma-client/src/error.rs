/// Result type used throughout the crate, defaulting to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by a [`Lemmatizer`](crate::Lemmatizer) and its readers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Only produced by a bounded [`RetryPolicy`](crate::RetryPolicy).
    #[error("giving up on word '{word}' after {attempts} attempts: {source}")]
    RetriesExhausted {
        word: String,
        attempts: u32,
        #[source]
        source: LookupError,
    },

    /// A pipeline worker panicked or was cancelled. Output stops here.
    #[error("lemmatizer worker failed: {0}")]
    WorkerFailed(String),
}

/// Invalid settings, detected before any word is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("requestCount of {0} is invalid.  Must be greater than 0.")]
    InvalidConcurrency(i64),

    #[error("cacheSize of {0} is invalid.  Must be greater than 0.")]
    InvalidCacheCapacity(i64),

    #[error("endpoint '{endpoint}' is invalid: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("retry backoff of {min_ms}..{max_ms} ms is invalid")]
    InvalidBackoff { min_ms: u64, max_ms: u64 },

    #[error("retry limit must allow at least one attempt")]
    InvalidAttemptLimit,
}

/// A failed remote lookup. These are transient: the cache loader retries them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("request for word '{word}' failed: {message}")]
    Http { word: String, message: String },

    #[error("StatusCode {status} when trying to lemmatize word '{word}' (expected 200)")]
    Status { word: String, status: u16 },

    #[error("malformed response for word '{word}': {message}")]
    Malformed { word: String, message: String },
}
