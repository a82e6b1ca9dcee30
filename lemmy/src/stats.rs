use crate::context::Context;
use lemma_client::CacheStats;
use serde::Serialize;

#[derive(Serialize)]
pub struct CacheStatsResponse {
    pub cache_stats: CacheStats,
    pub request_count: usize,
    pub endpoint: String,
}

impl CacheStatsResponse {
    pub fn from_context(context: &Context) -> Self {
        let lemmatizer = context.lemmatizer();
        Self {
            cache_stats: lemmatizer.cache_stats(),
            request_count: lemmatizer.config().concurrency,
            endpoint: context.settings().endpoint.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
