//! dealharvest - deals listing scraper with per-item shipping enrichment.
//!
//! Renders a deals listing page with a headless browser, extracts product
//! summaries, enriches each product with shipping text fetched from its
//! detail page by a bounded worker pool, and appends the finished batch to
//! a CSV dataset.

pub mod clean;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod models;
pub mod renderer;
pub mod scrape;
