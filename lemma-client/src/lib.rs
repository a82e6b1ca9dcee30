pub mod cache;
mod client;
mod config;
mod deduplication;
mod error;
mod pipeline;
mod reader;
mod retry;
pub mod tokenizer;


use cache::{LemmaCache, SharedLemmaCache};
pub use client::{LemmaLookup, PerseusClient, DEFAULT_ENDPOINT};
pub use config::LemmatizerConfig;
pub use error::{ConfigError, Error, LookupError, Result};
use getset::Getters;
pub use reader::LemmaReader;
pub use retry::{LemmaLoader, RetryPolicy};
use std::sync::Arc;
use tokenizer::Tokens;
use tokio::sync::mpsc;

// Re-export cache types
pub use cache::{CacheStats, Resolution};

/// Turns texts into streams of lemmas.
///
/// All readers created from one lemmatizer (or its clones) share one cache,
/// so a word is only looked up once per run however many texts contain it.
#[derive(Clone, Getters)]
pub struct Lemmatizer {
    #[get = "pub"]
    config: LemmatizerConfig,
    cache: SharedLemmaCache,
}

impl Lemmatizer {
    /// Create a lemmatizer querying `config.endpoint`.
    pub fn new(config: LemmatizerConfig) -> Result<Self> {
        config.validate()?;
        let lookup = PerseusClient::new(config.endpoint.clone());
        Self::with_lookup(config, Arc::new(lookup))
    }

    /// Create a lemmatizer backed by any [`LemmaLookup`].
    pub fn with_lookup(config: LemmatizerConfig, lookup: Arc<dyn LemmaLookup>) -> Result<Self> {
        config.validate()?;
        let loader = LemmaLoader::new(lookup, config.retry);
        let cache = LemmaCache::new(config.cache_capacity, loader)?;

        log::debug!(
            "Initialized Lemmatizer (requests: {}, cache size: {}, retry: {:?})",
            config.concurrency,
            config.cache_capacity,
            config.retry
        );

        Ok(Self {
            config,
            cache: Arc::new(cache),
        })
    }

    /// Lemmatize the words of `text`. Must be called within a tokio runtime.
    pub fn lemmatize_text(&self, text: impl Into<String>) -> LemmaReader {
        self.lemmatize_tokens(Tokens::new(text))
    }

    /// Lemmatize pre-tokenized input. Empty tokens are ignored. Must be called
    /// within a tokio runtime.
    pub fn lemmatize_tokens<I>(&self, tokens: I) -> LemmaReader
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let verbose = self.config.verbose;
        let tokens = tokens.into_iter().inspect(move |token| {
            if verbose {
                log::debug!("token is '{}'", token);
            }
        });

        let handle = pipeline::spawn(tokens, self.cache.clone(), self.config.concurrency, tx);
        LemmaReader::new(rx, handle)
    }

    /// Resolve a single word through the shared cache.
    pub async fn lemmatize_word(&self, word: &str) -> Resolution {
        self.cache.get(word).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
