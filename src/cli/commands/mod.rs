//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod clean;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "deals")]
#[command(about = "Deals listing scraper with per-item shipping enrichment")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the listing page and enrich every product with shipping info
    Scrape {
        /// Listing URL (overrides config)
        #[arg(long)]
        url: Option<String>,

        /// Output CSV path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Concurrent detail fetches
        #[arg(short, long)]
        workers: Option<usize>,

        /// Only keep the first N extracted products
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Normalize prices and compute discounts over a scraped dataset
    Clean {
        /// Raw dataset path (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned output path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Parse argv and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scrape {
            url,
            output,
            workers,
            limit,
        } => scrape::cmd_scrape(&settings, url, output, workers, limit).await,
        Commands::Clean { input, output } => clean::cmd_clean(&settings, input, output),
    }
}
