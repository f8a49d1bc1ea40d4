mod document;
mod index;
mod pipeline;
mod settings;

use crate::index::mapping::play_mapping;
use crate::index::{BulkLoader, IndexClient, IndexCredentials};
use crate::pipeline::{Pipeline, RunSummary};
use crate::settings::Settings;
use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use nhl_api::client::NhlApi;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    better_panic::install();
    // A missing .env is fine; the variables may come from the real environment.
    dotenv::dotenv().ok();

    let settings = Settings::parse();
    init_logger(settings.verbose);

    let options = match settings.pipeline_options() {
        Ok(options) => options,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let loader = match connect_index(&settings).await {
        Ok(loader) => loader,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let api = NhlApi::with_base_url(&settings.api_base).with_timeout(settings.api_timeout());
    let summary = Pipeline::new(api, options).run(&loader).await;
    report(summary)
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

/// Resolve credentials, build the index client, and optionally bootstrap the index.
async fn connect_index(settings: &Settings) -> anyhow::Result<BulkLoader> {
    let credentials = IndexCredentials::from_env().context("index credentials")?;
    let client = IndexClient::new(credentials, settings.index_timeout()).context("index client")?;
    info!("indexing into {} at {}", settings.index, client.endpoint());

    if settings.create_index {
        client
            .ensure_index(&settings.index, &play_mapping())
            .await
            .with_context(|| format!("creating index {}", settings.index))?;
    }

    Ok(BulkLoader::new(client, settings.index.clone(), settings.bulk_chunk_size as usize))
}

fn report(summary: RunSummary) -> ExitCode {
    let stats = &summary.stats;
    if stats.days_failed > 0 || stats.games_failed > 0 || stats.events_skipped > 0 {
        warn!(
            "skipped {} days, {} games, {} plays",
            stats.days_failed, stats.games_failed, stats.events_skipped
        );
    }
    println!("Total Plays Read: {}", stats.plays_read);

    match summary.load {
        Ok(load) => {
            if load.rejected > 0 {
                warn!("{} documents were rejected by the index", load.rejected);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("loading {} documents failed: {e}", stats.documents);
            ExitCode::FAILURE
        }
    }
}
