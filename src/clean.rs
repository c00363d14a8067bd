//! Dataset cleaning pass.
//!
//! A pure batch transform over the persisted dataset: normalizes raw
//! currency text to numbers, backfills missing values, and computes a
//! discount percentage. Reads the raw CSV and writes a cleaned copy;
//! never touches the raw file.

use std::path::Path;

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::models::{NOT_AVAILABLE, SHIPPING_UNAVAILABLE};

/// Column order of the cleaned dataset.
pub const CLEANED_HEADER: [&str; 7] = [
    "timestamp",
    "title",
    "price",
    "original_price",
    "shipping",
    "item_url",
    "discount_percentage",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    timestamp: String,
    title: String,
    price: String,
    original_price: String,
    shipping: String,
    item_url: String,
}

/// Counters for one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanStats {
    /// Rows read and written.
    pub rows: usize,
    /// Rows without a usable price after normalization.
    pub missing_price: usize,
    /// Rows whose original price fell back to the deal price.
    pub backfilled_original: usize,
}

/// Clean the raw dataset at `input` into `output`.
pub fn clean(input: &Path, output: &Path) -> anyhow::Result<CleanStats> {
    let numeric = Regex::new(r"^\d+(\.\d+)?$")?;

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    writer.write_record(CLEANED_HEADER)?;

    let mut stats = CleanStats::default();
    for row in reader.deserialize::<RawRow>() {
        let row = row.context("Malformed dataset row")?;

        let price = clean_currency(&row.price, &numeric);
        let original_price = clean_currency(&row.original_price, &numeric);
        let backfilled = original_price.is_none() && price.is_some();
        let original_price = original_price.or(price);

        let shipping = normalize_shipping(&row.shipping);
        let discount = discount_percentage(price, original_price);

        writer.write_record([
            row.timestamp.as_str(),
            row.title.as_str(),
            format_price(price).as_str(),
            format_price(original_price).as_str(),
            shipping.as_str(),
            row.item_url.as_str(),
            format!("{:.2}", discount).as_str(),
        ])?;

        stats.rows += 1;
        if price.is_none() {
            stats.missing_price += 1;
        }
        if backfilled {
            stats.backfilled_original += 1;
        }
    }
    writer.flush()?;

    debug!("Cleaned {} rows into {}", stats.rows, output.display());
    Ok(stats)
}

/// Strip currency markers; None when the remainder is not numeric.
fn clean_currency(value: &str, numeric: &Regex) -> Option<f64> {
    let cleaned = value.replace("US", "").replace('$', "").replace(',', "");
    let cleaned = cleaned.trim();
    if numeric.is_match(cleaned) {
        cleaned.parse().ok()
    } else {
        None
    }
}

fn normalize_shipping(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == NOT_AVAILABLE {
        SHIPPING_UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Percentage saved versus the original price, rounded to two decimals.
fn discount_percentage(price: Option<f64>, original_price: Option<f64>) -> f64 {
    match (price, original_price) {
        (Some(price), Some(original)) if original > 0.0 => {
            ((1.0 - price / original) * 100.0 * 100.0).round() / 100.0
        }
        _ => 0.0,
    }
}

fn format_price(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
