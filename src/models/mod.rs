//! Data model for scraped products.

mod product;

pub use product::{EnrichmentTask, ProductRecord, NOT_AVAILABLE, SHIPPING_UNAVAILABLE};
