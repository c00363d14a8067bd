//! Runtime settings with optional TOML file support.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::renderer::RendererConfig;

/// Default deals listing to crawl.
pub const DEFAULT_LISTING_URL: &str = "https://www.ebay.com/globaldeals/tech";

/// Config file looked up in the working directory.
const CONFIG_FILE: &str = "dealharvest.toml";

/// Application settings.
///
/// Every field has a serde default, so a config file only needs to name
/// what it overrides. CLI flags override file values in turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Listing page to crawl.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Raw dataset path (append-only CSV).
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Cleaned dataset path.
    #[serde(default = "default_cleaned_path")]
    pub cleaned_path: PathBuf,

    /// Concurrent detail fetches.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Seconds to wait for the listing page's client-side render.
    #[serde(default = "default_listing_settle_secs")]
    pub listing_settle_secs: u64,

    /// Seconds to wait for a detail page's client-side render.
    #[serde(default = "default_detail_settle_secs")]
    pub detail_settle_secs: u64,

    /// Page renderer options.
    #[serde(default)]
    pub renderer: RendererConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            dataset_path: default_dataset_path(),
            cleaned_path: default_cleaned_path(),
            workers: default_workers(),
            listing_settle_secs: default_listing_settle_secs(),
            detail_settle_secs: default_detail_settle_secs(),
            renderer: RendererConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from an explicit path, from `dealharvest.toml` in the
    /// working directory when present, or from defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => {
                let discovered = PathBuf::from(CONFIG_FILE);
                discovered.exists().then_some(discovered)
            }
        };

        match path {
            Some(path) => {
                let raw = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("Invalid config {}", path.display()))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn listing_settle(&self) -> Duration {
        Duration::from_secs(self.listing_settle_secs)
    }

    pub fn detail_settle(&self) -> Duration {
        Duration::from_secs(self.detail_settle_secs)
    }
}

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("ebay_tech_deals.csv")
}

fn default_cleaned_path() -> PathBuf {
    PathBuf::from("cleaned_ebay_deals.csv")
}

fn default_workers() -> usize {
    6
}

fn default_listing_settle_secs() -> u64 {
    5
}

fn default_detail_settle_secs() -> u64 {
    2
}
