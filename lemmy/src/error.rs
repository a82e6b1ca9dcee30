use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to load settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    #[error(transparent)]
    Lemmatizer(#[from] lemma_client::Error),

    #[error("Output and Input must both be either files or folders")]
    KindMismatch,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> AppError {
        let path = path.into();
        move |source| AppError::Io { path, source }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Settings(Box::new(err))
    }
}

impl From<lemma_client::ConfigError> for AppError {
    fn from(err: lemma_client::ConfigError) -> Self {
        AppError::Lemmatizer(err.into())
    }
}
