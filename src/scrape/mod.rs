//! Listing extraction and concurrent detail enrichment.

mod enrich;
mod extract;
mod scheduler;
mod types;

pub use enrich::DetailEnricher;
pub use extract::ProductExtractor;
pub use scheduler::EnrichmentScheduler;
pub use types::{EnrichConfig, EnrichEvent, EnrichStats};
