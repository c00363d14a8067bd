//! Scheduler and enricher behavior against a mock renderer.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use common::MockFactory;
use dealharvest::dataset::DatasetWriter;
use dealharvest::models::{ProductRecord, SHIPPING_UNAVAILABLE};
use dealharvest::scrape::{DetailEnricher, EnrichConfig, EnrichEvent, EnrichmentScheduler, EnrichStats};

fn record(url: &str) -> ProductRecord {
    ProductRecord {
        captured_at: "2025-04-01 12:00:00".to_string(),
        title: "Item".to_string(),
        price: "US $10.00".to_string(),
        original_price: "US $20.00".to_string(),
        item_url: url.to_string(),
        shipping: SHIPPING_UNAVAILABLE.to_string(),
    }
}

fn shipping_page(text: &str) -> String {
    format!("<html><body><div class=\"ship\">{text}</div></body></html>")
}

fn config(workers: usize) -> EnrichConfig {
    EnrichConfig {
        workers,
        settle_delay: Duration::from_millis(0),
    }
}

fn drain(mut rx: mpsc::Receiver<EnrichEvent>) -> tokio::task::JoinHandle<Vec<EnrichEvent>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    })
}

#[tokio::test]
async fn pool_never_exceeds_its_concurrency_limit() {
    let mut factory = MockFactory::new().holding_for(Duration::from_millis(30));
    for i in 0..12 {
        factory = factory.with_page(
            &format!("https://example.com/itm/{i}"),
            &shipping_page("Free shipping"),
        );
    }
    let factory = Arc::new(factory);
    let gauges = factory.gauges.clone();

    let mut records: Vec<ProductRecord> = (0..12)
        .map(|i| record(&format!("https://example.com/itm/{i}")))
        .collect();

    let (event_tx, event_rx) = mpsc::channel(32);
    let events = drain(event_rx);

    let scheduler = EnrichmentScheduler::new(factory, config(3));
    let stats = scheduler.run(&mut records, event_tx).await;

    assert_eq!(
        stats,
        EnrichStats {
            enriched: 12,
            fallback: 0,
        }
    );
    assert!(gauges.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert_eq!(gauges.creates.load(Ordering::SeqCst), 12);
    for r in &records {
        assert_eq!(r.shipping, "Free shipping");
    }

    // Every record produced a completion event
    let events = events.await.unwrap();
    let completed = events
        .iter()
        .filter(|e| matches!(e, EnrichEvent::Completed { .. }))
        .count();
    assert_eq!(completed, 12);
}

#[tokio::test]
async fn every_renderer_is_released() {
    let factory = Arc::new(
        MockFactory::new()
            .with_page("https://example.com/itm/ok", &shipping_page("Free shipping"))
            .failing_on("https://example.com/itm/bad"),
    );
    let gauges = factory.gauges.clone();

    let mut records = vec![
        record("https://example.com/itm/ok"),
        record("https://example.com/itm/bad"),
        record("https://example.com/itm/ok"),
    ];

    let (event_tx, event_rx) = mpsc::channel(32);
    drop(event_rx); // progress display is optional

    let scheduler = EnrichmentScheduler::new(factory, config(2));
    scheduler.run(&mut records, event_tx).await;

    assert_eq!(
        gauges.closes.load(Ordering::SeqCst),
        gauges.creates.load(Ordering::SeqCst)
    );
    assert_eq!(gauges.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unusable_urls_skip_the_renderer_entirely() {
    let factory = Arc::new(MockFactory::new());
    let gauges = factory.gauges.clone();
    let enricher = DetailEnricher::new(factory, Duration::from_millis(0));

    assert_eq!(enricher.enrich("N/A").await, SHIPPING_UNAVAILABLE);
    assert_eq!(enricher.enrich("").await, SHIPPING_UNAVAILABLE);
    assert_eq!(enricher.enrich("ftp://example.com/itm/1").await, SHIPPING_UNAVAILABLE);
    assert_eq!(enricher.enrich("itm/relative").await, SHIPPING_UNAVAILABLE);

    assert_eq!(gauges.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn navigation_failure_resolves_to_the_sentinel() {
    let factory = Arc::new(MockFactory::new().failing_on("https://example.com/itm/down"));
    let enricher = DetailEnricher::new(factory, Duration::from_millis(0));

    assert_eq!(
        enricher.enrich("https://example.com/itm/down").await,
        SHIPPING_UNAVAILABLE
    );
}

#[tokio::test]
async fn non_answer_pages_resolve_to_the_sentinel() {
    let factory = Arc::new(
        MockFactory::new()
            .with_page("https://example.com/itm/vague", &shipping_page("for shipping"))
            .with_page("https://example.com/itm/blank", "<html><body><p>no match here</p></body></html>"),
    );
    let enricher = DetailEnricher::new(factory, Duration::from_millis(0));

    assert_eq!(
        enricher.enrich("https://example.com/itm/vague").await,
        SHIPPING_UNAVAILABLE
    );
    assert_eq!(
        enricher.enrich("https://example.com/itm/blank").await,
        SHIPPING_UNAVAILABLE
    );
}

#[tokio::test]
async fn one_failed_fetch_never_disturbs_the_rest_of_the_batch() {
    let factory = Arc::new(
        MockFactory::new()
            .with_page("https://example.com/itm/1", &shipping_page("Free 2-day shipping"))
            .failing_on("https://example.com/itm/2")
            .with_page("https://example.com/itm/3", &shipping_page("US $4.99 shipping")),
    );

    let mut records = vec![
        record("https://example.com/itm/1"),
        record("https://example.com/itm/2"),
        record("https://example.com/itm/3"),
    ];

    let (event_tx, event_rx) = mpsc::channel(32);
    drop(event_rx);

    let scheduler = EnrichmentScheduler::new(factory, config(2));
    let stats = scheduler.run(&mut records, event_tx).await;

    assert_eq!(
        stats,
        EnrichStats {
            enriched: 2,
            fallback: 1,
        }
    );

    // Persist and confirm row order plus the isolated fallback
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deals.csv");
    DatasetWriter::new(&path).append(&records).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("Free 2-day shipping"));
    assert!(lines[1].contains("https://example.com/itm/1"));
    assert!(lines[2].contains(SHIPPING_UNAVAILABLE));
    assert!(lines[2].contains("https://example.com/itm/2"));
    assert!(lines[3].contains("US $4.99 shipping"));
    assert!(lines[3].contains("https://example.com/itm/3"));
}
