#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the feed run importer.

use std::time::Instant;

use clap::Parser;
use feed_log_database::db::{self, ConnectionSettings};
use feed_log_database::mongo::MongoFeedRunStore;
use feed_log_import::ImportError;

#[derive(Parser)]
#[command(
    name = "feed_log_import",
    about = "Load a feed run JSON export into the document store"
)]
struct Cli {
    /// Feed URL to download (overrides the `FEED_URL` env var)
    #[arg(long)]
    url: Option<String>,
    /// Skip creating the collection indexes after inserting
    #[arg(long)]
    skip_indexes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    let cli = Cli::parse();

    let settings = ConnectionSettings::from_env();
    let url = cli
        .url
        .or_else(|| std::env::var("FEED_URL").ok())
        .filter(|url| !url.trim().is_empty());

    let (Ok(settings), Some(url)) = (settings, url) else {
        log::error!("Environment variables MONGO_URI and FEED_URL must be set.");
        std::process::exit(1);
    };

    let start = Instant::now();

    log::info!("Connecting to database...");
    let database = db::connect(&settings).await?;
    let store = MongoFeedRunStore::new(&database, &settings.collection);

    let result = async {
        let client = reqwest::Client::new();
        let payload = feed_log_import::download_feed(&client, &url).await?;
        let runs = feed_log_import::parse_feed(payload)?;

        log::info!(
            "Inserting {} feed runs into '{}'",
            runs.len(),
            store.collection_name()
        );
        let summary = feed_log_import::import_runs(&store, runs, !cli.skip_indexes).await?;
        Ok::<_, ImportError>(summary)
    }
    .await;

    database.client().clone().shutdown().await;
    log::info!("Database connection closed");

    let summary = result?;
    log::info!(
        "Import complete: {}/{} inserted in {:.1}s",
        summary.inserted,
        summary.downloaded,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
