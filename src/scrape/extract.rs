//! Listing-page product extraction.

use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::{ProductRecord, NOT_AVAILABLE, SHIPPING_UNAVAILABLE};

/// Format of the per-batch capture timestamp.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Extracts product records from rendered listing HTML.
///
/// Each sub-field lookup is independently fault-tolerant: a card missing
/// one element still yields a record, with the sentinel standing in for
/// the missing field.
pub struct ProductExtractor {
    card: Selector,
    title: Selector,
    price: Selector,
    original_price: Selector,
    detail_link: Selector,
}

impl ProductExtractor {
    pub fn new() -> Self {
        Self {
            card: Selector::parse("div.dne-itemtile").expect("card selector"),
            title: Selector::parse(".dne-itemtile-title span").expect("title selector"),
            price: Selector::parse(".dne-itemtile-price").expect("price selector"),
            original_price: Selector::parse(".itemtile-price-strikethrough")
                .expect("original price selector"),
            detail_link: Selector::parse(".dne-itemtile-detail a").expect("link selector"),
        }
    }

    /// Extract all product cards from `html`, in DOM order.
    ///
    /// Every record of the batch carries the same `captured_at` stamp.
    /// Relative detail links are resolved against `listing_url`.
    pub fn extract(
        &self,
        html: &str,
        listing_url: &str,
        captured_at: DateTime<Local>,
    ) -> Vec<ProductRecord> {
        let captured_at = captured_at.format(TIMESTAMP_FORMAT).to_string();
        let document = Html::parse_document(html);

        let mut records = Vec::new();
        for card in document.select(&self.card) {
            let item_url = self
                .link_href(&card)
                .map(|href| resolve_url(listing_url, &href));

            records.push(ProductRecord {
                captured_at: captured_at.clone(),
                title: field_or_sentinel(self.text_of(&card, &self.title)),
                price: field_or_sentinel(self.text_of(&card, &self.price)),
                original_price: field_or_sentinel(self.text_of(&card, &self.original_price)),
                item_url: field_or_sentinel(item_url),
                shipping: SHIPPING_UNAVAILABLE.to_string(),
            });
        }

        debug!("Extracted {} product cards", records.len());
        records
    }

    /// Trimmed text of the first element under `card` matching `selector`.
    fn text_of(&self, card: &ElementRef, selector: &Selector) -> Option<String> {
        let element = card.select(selector).next()?;
        let text = element.text().collect::<String>().trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// `href` of the card's detail link.
    fn link_href(&self, card: &ElementRef) -> Option<String> {
        card.select(&self.detail_link)
            .next()?
            .value()
            .attr("href")
            .map(|href| href.to_string())
    }
}

impl Default for ProductExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn field_or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Resolve a path to a full URL, handling both absolute and relative paths.
fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    Url::parse(base_url)
        .ok()
        .and_then(|base| base.join(path).ok())
        .map(|joined| joined.to_string())
        .unwrap_or_else(|| path.to_string())
}
