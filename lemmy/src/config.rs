use clap::Parser;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use lemma_client::{ConfigError, LemmatizerConfig, RetryPolicy, DEFAULT_ENDPOINT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(
    name = "lemmy",
    version,
    about = "Lemmatizes latin text using www.perseus.tufts.edu"
)]
pub struct Cli {
    /// File or Folder containing latin text to be lemmatized
    pub input: PathBuf,

    /// File or Folder to output the lemmatized text
    pub output: PathBuf,

    /// The max number of concurrent requests to send to the lookup service (More isn't always better)
    #[clap(short = 'r', long, allow_negative_numbers = true)]
    pub request_count: Option<i64>,

    /// The max number of lemmatized words to cache
    #[clap(short = 'c', long, allow_negative_numbers = true)]
    pub cache_size: Option<i64>,

    /// Print extra debugging information
    #[clap(short = 'v', long)]
    pub verbose: bool,

    /// Lookup URL; the word is appended to it
    #[clap(long)]
    pub endpoint: Option<String>,

    /// Settings file
    #[clap(long, default_value = "lemmy.yaml")]
    pub config: PathBuf,

    /// Print cache statistics as JSON to stderr when done
    #[clap(long)]
    pub stats: bool,
}

/// Effective settings after layering defaults, settings file, environment
/// (`LEMMY_*`) and command line, in increasing priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub request_count: i64,
    pub cache_size: i64,
    pub verbose: bool,
    pub endpoint: String,
    pub retry: RetryPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            request_count: 10,
            cache_size: 10000,
            verbose: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Only the values given on the command line.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    request_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
}

impl From<&Cli> for Overrides {
    fn from(cli: &Cli) -> Self {
        Self {
            request_count: cli.request_count,
            cache_size: cli.cache_size,
            verbose: cli.verbose.then_some(true),
            endpoint: cli.endpoint.clone(),
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(&cli.config, Overrides::from(cli)).extract()
    }

    fn figment(file: &Path, overrides: Overrides) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed("LEMMY_"))
            .merge(Serialized::defaults(overrides))
    }

    pub fn lemmatizer_config(&self) -> Result<LemmatizerConfig, ConfigError> {
        Ok(LemmatizerConfig::new(self.request_count, self.cache_size)?
            .with_endpoint(self.endpoint.clone())?
            .with_retry(self.retry)?
            .with_verbose(self.verbose))
    }
}
