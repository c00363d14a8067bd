//! Per-item detail-page enrichment.
//!
//! Fetches one product's detail page with a fresh renderer and pulls the
//! first shipping-related text out of it. Never fails outward: every
//! error path resolves to the sentinel.

use std::sync::Arc;
use std::time::Duration;

use scraper::{ElementRef, Html, Node};
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::models::{NOT_AVAILABLE, SHIPPING_UNAVAILABLE};
use crate::renderer::{PageRenderer, RenderError, RendererFactory};

/// Raw matches that carry no real shipping information.
const NON_ANSWERS: &[&str] = &["", "see details", "for shipping"];

/// Fetches one item's detail page and extracts its shipping text.
pub struct DetailEnricher {
    factory: Arc<dyn RendererFactory>,
    settle_delay: Duration,
}

impl DetailEnricher {
    pub fn new(factory: Arc<dyn RendererFactory>, settle_delay: Duration) -> Self {
        Self {
            factory,
            settle_delay,
        }
    }

    /// Resolve shipping text for `url`.
    ///
    /// URLs that are empty, the field sentinel, or not absolute http(s)
    /// return the sentinel without a renderer ever being created.
    pub async fn enrich(&self, url: &str) -> String {
        if !is_fetchable(url) {
            debug!("Skipping detail fetch for unusable URL: {:?}", url);
            return SHIPPING_UNAVAILABLE.to_string();
        }

        let mut renderer = match self.factory.create().await {
            Ok(renderer) => renderer,
            Err(e) => {
                warn!("Renderer launch failed for {}: {}", url, e);
                return SHIPPING_UNAVAILABLE.to_string();
            }
        };

        // Inner call so the renderer is released on every exit path
        let shipping = match self.fetch_shipping(renderer.as_mut(), url).await {
            Ok(raw) => normalize_shipping(&raw),
            Err(e) => {
                debug!("Detail fetch failed for {}: {}", url, e);
                SHIPPING_UNAVAILABLE.to_string()
            }
        };
        renderer.close().await;

        shipping
    }

    async fn fetch_shipping(
        &self,
        renderer: &mut dyn PageRenderer,
        url: &str,
    ) -> Result<String, RenderError> {
        renderer.goto(url).await?;
        sleep(self.settle_delay).await;
        let html = renderer.content().await?;
        Ok(find_shipping_text(&html).unwrap_or_default())
    }
}

/// True when `url` parses as an absolute http(s) URL worth navigating to.
fn is_fetchable(url: &str) -> bool {
    if url.is_empty() || url == NOT_AVAILABLE {
        return false;
    }
    matches!(Url::parse(url), Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https")
}

/// First element in document order whose direct text mentions shipping,
/// taken as that element's full visible text.
///
/// Direct text only: an element matches on its own text nodes, not on a
/// descendant's, mirroring an XPath text() test. Script and style bodies
/// are not visible text and never match.
fn find_shipping_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if matches!(element.value().name(), "script" | "style") {
            continue;
        }

        let hit = element.children().any(|child| match child.value() {
            Node::Text(text) => text.to_lowercase().contains("shipping"),
            _ => false,
        });
        if hit {
            let text = element.text().collect::<String>().trim().to_string();
            return Some(text);
        }
    }

    None
}

/// Collapse known non-answers to the sentinel.
fn normalize_shipping(raw: &str) -> String {
    let trimmed = raw.trim();
    if NON_ANSWERS.contains(&trimmed.to_lowercase().as_str()) {
        SHIPPING_UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unusable_urls() {
        assert!(!is_fetchable(""));
        assert!(!is_fetchable(NOT_AVAILABLE));
        assert!(!is_fetchable("ftp://example.com/item"));
        assert!(!is_fetchable("itm/12345"));
        assert!(!is_fetchable("javascript:void(0)"));
    }

    #[test]
    fn accepts_absolute_http_urls() {
        assert!(is_fetchable("http://example.com/itm/1"));
        assert!(is_fetchable("https://example.com/itm/1?var=0"));
    }

    #[test]
    fn normalizes_non_answers_to_the_sentinel() {
        assert_eq!(normalize_shipping(""), SHIPPING_UNAVAILABLE);
        assert_eq!(normalize_shipping("  "), SHIPPING_UNAVAILABLE);
        assert_eq!(normalize_shipping("See Details"), SHIPPING_UNAVAILABLE);
        assert_eq!(normalize_shipping("SEE DETAILS"), SHIPPING_UNAVAILABLE);
        assert_eq!(normalize_shipping("for shipping"), SHIPPING_UNAVAILABLE);
    }

    #[test]
    fn keeps_real_answers_trimmed() {
        assert_eq!(normalize_shipping("  Free shipping  "), "Free shipping");
        assert_eq!(normalize_shipping("US $12.50 shipping"), "US $12.50 shipping");
    }

    #[test]
    fn finds_first_element_with_shipping_in_its_direct_text() {
        let html = r#"<html><body>
            <div id="other">Returns accepted</div>
            <div id="ship">Free Shipping on orders</div>
            <div>Shipping elsewhere too</div>
        </body></html>"#;

        assert_eq!(
            find_shipping_text(html).as_deref(),
            Some("Free Shipping on orders")
        );
    }

    #[test]
    fn matches_case_insensitively() {
        let html = r#"<html><body><span>FAST SHIPPING available</span></body></html>"#;
        assert_eq!(
            find_shipping_text(html).as_deref(),
            Some("FAST SHIPPING available")
        );
    }

    #[test]
    fn matching_element_reports_its_full_text() {
        let html = r#"<html><body>
            <p>Shipping: <b>US $4.99</b> via economy</p>
        </body></html>"#;

        assert_eq!(
            find_shipping_text(html).as_deref(),
            Some("Shipping: US $4.99 via economy")
        );
    }

    #[test]
    fn descendant_text_does_not_match_the_ancestor() {
        // The wrapper div has no shipping text of its own; the span does.
        let html = r#"<html><body>
            <div><em>wrapped</em><span>Free shipping</span></div>
        </body></html>"#;

        assert_eq!(find_shipping_text(html).as_deref(), Some("Free shipping"));
    }

    #[test]
    fn script_bodies_never_match() {
        let html = r#"<html><head>
            <script>var shippingConfig = {};</script>
        </head><body>
            <div>Expedited Shipping</div>
        </body></html>"#;

        assert_eq!(
            find_shipping_text(html).as_deref(),
            Some("Expedited Shipping")
        );
    }

    #[test]
    fn no_match_yields_none() {
        let html = r#"<html><body><div>Nothing relevant</div></body></html>"#;
        assert_eq!(find_shipping_text(html), None);
    }
}
