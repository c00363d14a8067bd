//! Product record types and field sentinels.

use serde::{Deserialize, Serialize};

/// Sentinel for a listing field whose source element was absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Sentinel for shipping info that could not be resolved.
pub const SHIPPING_UNAVAILABLE: &str = "Shipping info unavailable";

/// One product scraped from the deals listing.
///
/// Every field always holds text: a field whose source element was missing
/// carries one of the sentinels above, never an empty string, so downstream
/// consumers need no null handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Capture time, stamped once for the whole extraction batch.
    pub captured_at: String,
    /// Product title.
    pub title: String,
    /// Deal price as raw currency text.
    pub price: String,
    /// Pre-deal price as raw currency text.
    pub original_price: String,
    /// Absolute URL of the item's detail page.
    pub item_url: String,
    /// Shipping text. Starts as the sentinel and is overwritten exactly
    /// once by enrichment.
    pub shipping: String,
}

/// Unit of work for the enrichment pool: one record's position in the
/// batch and its detail-page URL. Lives only for the concurrent phase.
#[derive(Debug, Clone)]
pub struct EnrichmentTask {
    pub index: usize,
    pub url: String,
}
