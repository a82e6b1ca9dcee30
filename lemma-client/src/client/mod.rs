mod perseus;

use crate::error::LookupError;
use async_trait::async_trait;

pub use perseus::{PerseusClient, DEFAULT_ENDPOINT};

/// A remote dictionary that maps one word to its lemma.
///
/// Implementations perform exactly one query per call. `Ok(None)` means the
/// service answered but knows no canonical form; any `Err` is treated as
/// transient and retried by the cache loader.
#[async_trait]
pub trait LemmaLookup: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<Option<String>, LookupError>;
}
