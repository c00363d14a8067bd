//! The scrape command: render, extract, enrich, persist.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::dataset::DatasetWriter;
use crate::renderer::{ChromiumFactory, RendererFactory};
use crate::scrape::{EnrichConfig, EnrichEvent, EnrichmentScheduler, ProductExtractor};

pub async fn cmd_scrape(
    settings: &Settings,
    url: Option<String>,
    output: Option<PathBuf>,
    workers: Option<usize>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let listing_url = url.unwrap_or_else(|| settings.listing_url.clone());
    let output = output.unwrap_or_else(|| settings.dataset_path.clone());
    let workers = workers.unwrap_or(settings.workers);

    let factory: Arc<dyn RendererFactory> =
        Arc::new(ChromiumFactory::new(settings.renderer.clone()));

    println!("{} Rendering {}", style("→").cyan(), listing_url);
    let html = render_listing(factory.as_ref(), &listing_url, settings).await?;

    let mut records = ProductExtractor::new().extract(&html, &listing_url, Local::now());
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    if records.is_empty() {
        println!("{} No product cards found", style("!").yellow());
        return Ok(());
    }

    println!(
        "{} Found {} products. Fetching shipping info with {} workers",
        style("→").cyan(),
        records.len(),
        workers
    );

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let (event_tx, mut event_rx) = mpsc::channel(32);
    let progress = {
        let pb = pb.clone();
        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                if let EnrichEvent::Completed { .. } = event {
                    pb.inc(1);
                }
            }
        })
    };

    let scheduler = EnrichmentScheduler::new(
        factory,
        EnrichConfig {
            workers,
            settle_delay: settings.detail_settle(),
        },
    );
    let stats = scheduler.run(&mut records, event_tx).await;
    let _ = progress.await;
    pb.finish_and_clear();

    DatasetWriter::new(&output)
        .append(&records)
        .with_context(|| format!("Failed to append to {}", output.display()))?;

    println!(
        "{} Scraped {} products ({} shipping fetched, {} fallback). Data saved to {}",
        style("✓").green(),
        records.len(),
        stats.enriched,
        stats.fallback,
        output.display()
    );
    Ok(())
}

/// Render the listing page to HTML, releasing the renderer on every path.
async fn render_listing(
    factory: &dyn RendererFactory,
    url: &str,
    settings: &Settings,
) -> anyhow::Result<String> {
    let mut renderer = factory
        .create()
        .await
        .context("Failed to launch page renderer")?;

    let result = async {
        renderer.goto(url).await?;
        tokio::time::sleep(settings.listing_settle()).await;
        renderer.scroll_to_stable().await?;
        renderer.content().await
    }
    .await;
    renderer.close().await;

    result.context("Listing page failed to render")
}
