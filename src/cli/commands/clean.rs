//! The clean command: normalize a scraped dataset.

use std::path::PathBuf;

use console::style;

use crate::clean;
use crate::config::Settings;

pub fn cmd_clean(
    settings: &Settings,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let input = input.unwrap_or_else(|| settings.dataset_path.clone());
    let output = output.unwrap_or_else(|| settings.cleaned_path.clone());

    let stats = clean::clean(&input, &output)?;

    println!(
        "{} Cleaned {} rows ({} without a usable price, {} original prices backfilled). Saved to {}",
        style("✓").green(),
        stats.rows,
        stats.missing_price,
        stats.backfilled_original,
        output.display()
    );
    Ok(())
}
