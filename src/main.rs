//! dealharvest - deals listing scraper.
//!
//! Crawls a deals listing page, enriches every product with shipping info
//! from its detail page, and appends the results to a CSV dataset.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealharvest::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "dealharvest=info"
    } else {
        "dealharvest=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
