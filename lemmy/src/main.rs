mod config;
mod context;
mod error;
mod files;
mod stats;

use clap::Parser;
use config::{Cli, Settings};
use context::Context;
use error::AppError;
use log::{warn, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use stats::CacheStatsResponse;
use std::process;

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("lemmy")
        .add_filter_allow_str("lemma_client")
        .add_filter_allow_str("utils")
        .build();

    if let Err(err) = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto) {
        eprintln!("Failed to initialize logging: {}", err);
    }
}

async fn run(cli: &Cli) -> Result<(), AppError> {
    let settings = Settings::load(cli)?;
    init_logging(settings.verbose);

    let context = Context::new(settings)?;
    files::run(&context, &cli.input, &cli.output).await?;

    if cli.stats {
        match CacheStatsResponse::from_context(&context).to_json() {
            Ok(json) => eprintln!("{}", json),
            Err(err) => warn!("Failed to serialize cache statistics: {}", err),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli).await {
        eprintln!("ERROR: {}", err);
        process::exit(1);
    }
}
