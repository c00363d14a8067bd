//! Page rendering behind an explicit factory.
//!
//! Components never touch a global browser handle: they receive a
//! [`RendererFactory`] and create a fresh renderer per task, scoped to
//! that task's lifetime. One task's crash cannot leak state into another.

#[cfg(feature = "browser")]
mod chromium;
mod config;

#[cfg(feature = "browser")]
pub use chromium::ChromiumFactory;
pub use config::RendererConfig;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a page renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Browser launch failed: {0}")]
    Launch(String),
    #[error("Navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },
    #[error("Navigation timed out after {0}s")]
    Timeout(u64),
    #[error("Script evaluation failed: {0}")]
    Evaluation(String),
}

/// A rendered-page handle: navigate, settle dynamic content, read the DOM.
#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to a URL and wait for the initial load.
    async fn goto(&mut self, url: &str) -> Result<(), RenderError>;

    /// Scroll until the document height stops growing, so lazy-loaded
    /// content is present before extraction.
    async fn scroll_to_stable(&mut self) -> Result<(), RenderError>;

    /// Current document HTML.
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Release the underlying browser. Called on every exit path.
    async fn close(&mut self);
}

/// Creates fresh, mutually isolated renderer instances.
#[async_trait]
pub trait RendererFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RenderError>;
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct ChromiumFactory {
    #[allow(dead_code)]
    config: RendererConfig,
}

#[cfg(not(feature = "browser"))]
impl ChromiumFactory {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl RendererFactory for ChromiumFactory {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RenderError> {
        Err(RenderError::Launch(
            "Browser support not compiled. Rebuild with: cargo build --features browser".to_string(),
        ))
    }
}
