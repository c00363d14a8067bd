//! Shared test doubles for the enrichment pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use dealharvest::renderer::{PageRenderer, RenderError, RendererFactory};

/// Gauges shared between a factory and the renderers it hands out.
#[derive(Default)]
pub struct FactoryGauges {
    /// Renderer instances created.
    pub creates: AtomicUsize,
    /// Renderers currently between goto and close.
    pub in_flight: AtomicUsize,
    /// High-water mark of `in_flight`.
    pub max_in_flight: AtomicUsize,
    /// Renderers released.
    pub closes: AtomicUsize,
}

/// Renderer factory serving canned detail pages.
pub struct MockFactory {
    pages: HashMap<String, String>,
    fail_urls: Vec<String>,
    hold: Duration,
    pub gauges: Arc<FactoryGauges>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fail_urls: Vec::new(),
            hold: Duration::from_millis(10),
            gauges: Arc::default(),
        }
    }

    /// Serve `html` for `url`.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Make navigation to `url` fail.
    pub fn failing_on(mut self, url: &str) -> Self {
        self.fail_urls.push(url.to_string());
        self
    }

    /// Keep each navigation in flight for `hold`, so overlap is observable.
    pub fn holding_for(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }
}

#[async_trait]
impl RendererFactory for MockFactory {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RenderError> {
        self.gauges.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockRenderer {
            pages: self.pages.clone(),
            fail_urls: self.fail_urls.clone(),
            hold: self.hold,
            gauges: self.gauges.clone(),
            current: None,
            opened: false,
        }))
    }
}

pub struct MockRenderer {
    pages: HashMap<String, String>,
    fail_urls: Vec<String>,
    hold: Duration,
    gauges: Arc<FactoryGauges>,
    current: Option<String>,
    opened: bool,
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn goto(&mut self, url: &str) -> Result<(), RenderError> {
        self.opened = true;
        let in_flight = self.gauges.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauges
            .max_in_flight
            .fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;

        if self.fail_urls.iter().any(|failing| failing == url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        self.current = Some(
            self.pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| "<html><body></body></html>".to_string()),
        );
        Ok(())
    }

    async fn scroll_to_stable(&mut self) -> Result<(), RenderError> {
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.current
            .clone()
            .ok_or_else(|| RenderError::Evaluation("no page loaded".to_string()))
    }

    async fn close(&mut self) {
        if self.opened {
            self.gauges.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        self.gauges.closes.fetch_add(1, Ordering::SeqCst);
    }
}
