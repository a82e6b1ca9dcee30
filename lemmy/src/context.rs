use crate::config::Settings;
use crate::error::AppError;
use getset::Getters;
use lemma_client::Lemmatizer;
use log::info;

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    lemmatizer: Lemmatizer,
    settings: Settings,
}

impl Context {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let lemmatizer = Lemmatizer::new(settings.lemmatizer_config()?)?;

        info!(
            "Initialized Lemmatizer (requests: {}, cache size: {})",
            settings.request_count, settings.cache_size
        );

        Ok(Self::with_lemmatizer(lemmatizer, settings))
    }

    pub fn with_lemmatizer(lemmatizer: Lemmatizer, settings: Settings) -> Self {
        Self {
            lemmatizer,
            settings,
        }
    }
}
