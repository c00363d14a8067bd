//! Bounded worker pool fanning detail fetches out over a batch.
//!
//! Separated from UI concerns - emits events for progress tracking.
//! Results are applied in completion order; the only ordering guarantee
//! is that every record is finalized when `run` returns.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use super::enrich::DetailEnricher;
use super::types::{EnrichConfig, EnrichEvent, EnrichStats};
use crate::models::{EnrichmentTask, ProductRecord, SHIPPING_UNAVAILABLE};
use crate::renderer::RendererFactory;

/// Runs detail enrichment over a batch with bounded concurrency.
pub struct EnrichmentScheduler {
    factory: Arc<dyn RendererFactory>,
    config: EnrichConfig,
}

impl EnrichmentScheduler {
    pub fn new(factory: Arc<dyn RendererFactory>, config: EnrichConfig) -> Self {
        Self { factory, config }
    }

    /// Enrich every record's shipping field in place.
    ///
    /// Spawns up to `workers` tasks that claim records from a shared
    /// queue; each claim runs one detail fetch with its own renderer.
    /// Returns only after every record is finalized. Event send failures
    /// are ignored: progress display is optional, enrichment is not.
    pub async fn run(
        &self,
        records: &mut [ProductRecord],
        event_tx: mpsc::Sender<EnrichEvent>,
    ) -> EnrichStats {
        if records.is_empty() {
            return EnrichStats::default();
        }

        // Reversed so queue.pop() hands tasks out in batch order
        let tasks: Vec<EnrichmentTask> = records
            .iter()
            .enumerate()
            .rev()
            .map(|(index, record)| EnrichmentTask {
                index,
                url: record.item_url.clone(),
            })
            .collect();
        let queue = Arc::new(Mutex::new(tasks));

        let workers = self.config.workers.clamp(1, records.len());
        let (result_tx, mut result_rx) = mpsc::channel::<(usize, String)>(workers);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let queue = queue.clone();
            let result_tx = result_tx.clone();
            let event_tx = event_tx.clone();
            let enricher = DetailEnricher::new(self.factory.clone(), self.config.settle_delay);

            handles.push(tokio::spawn(async move {
                loop {
                    let task = { queue.lock().await.pop() };
                    let Some(task) = task else { break };

                    let _ = event_tx
                        .send(EnrichEvent::Started {
                            worker_id,
                            url: task.url.clone(),
                        })
                        .await;

                    let shipping = enricher.enrich(&task.url).await;
                    if result_tx.send((task.index, shipping)).await.is_err() {
                        break;
                    }
                }
            }));
        }
        drop(result_tx);

        // Apply results as they complete, not batched at the end
        let mut stats = EnrichStats::default();
        let mut resolved = vec![false; records.len()];
        while let Some((index, shipping)) = result_rx.recv().await {
            let fallback = shipping == SHIPPING_UNAVAILABLE;
            if fallback {
                stats.fallback += 1;
            } else {
                stats.enriched += 1;
            }
            records[index].shipping = shipping;
            resolved[index] = true;

            let _ = event_tx.send(EnrichEvent::Completed { index, fallback }).await;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Enrichment worker panicked: {}", e);
            }
        }

        // A record whose result never arrived still gets the sentinel
        for (index, record) in records.iter_mut().enumerate() {
            if !resolved[index] {
                record.shipping = SHIPPING_UNAVAILABLE.to_string();
                stats.fallback += 1;
            }
        }

        debug!(
            "Enrichment finished: {} fetched, {} fallback",
            stats.enriched, stats.fallback
        );
        stats
    }
}
