//! solrq: command-line Solr search with cursor pagination.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Cli::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut settings = solrpage::load_settings().await;
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }
    tracing::debug!(endpoint = %settings.endpoint, "Settings loaded");

    cli::run(args.command, settings).await
}
