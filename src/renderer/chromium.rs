//! Chromium-backed page renderer over the DevTools protocol.
//!
//! Every [`ChromiumFactory::create`] call launches (or connects to) its own
//! browser process, so renderer instances share nothing.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::handler::HandlerConfig;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{PageRenderer, RenderError, RendererConfig, RendererFactory};

/// Default user agent for rendered requests.
const RENDERER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Pause between scroll rounds while lazy-loaded content appears.
const SCROLL_PAUSE: Duration = Duration::from_secs(2);

/// Upper bound on scroll rounds for pages that never stop growing.
const MAX_SCROLL_ROUNDS: usize = 20;

/// Launches a fresh headless Chromium per renderer instance.
pub struct ChromiumFactory {
    config: RendererConfig,
}

impl ChromiumFactory {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Create a new factory.
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Find a Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf, RenderError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        // Check if in PATH via `which`
        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        debug!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(RenderError::Launch(
            "Chrome/Chromium not found. Please install it:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
                .to_string(),
        ))
    }

    /// Launch a browser, or connect to a remote one when configured.
    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), RenderError> {
        if let Some(remote_url) = self.config.remote_url.clone() {
            return self.connect_remote(&remote_url).await;
        }

        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;

        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // Set headless mode (with_head means NOT headless, confusingly)
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
            .arg("--disable-gpu") // Recommended for headless
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-extensions")
            .arg("--window-size=1920,1080")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // Spawn handler task
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<(Browser, JoinHandle<()>), RenderError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let client = reqwest::Client::new();
        let resp: serde_json::Value = client
            .get(&version_url)
            .send()
            .await
            .map_err(|e| RenderError::Launch(format!("Failed to connect to remote browser: {}", e)))?
            .json()
            .await
            .map_err(|e| RenderError::Launch(format!("Failed to parse browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RenderError::Launch("No webSocketDebuggerUrl in response".to_string()))?;

        debug!("Connecting to WebSocket: {}", ws_url);

        let handler_config = HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| RenderError::Launch(format!("Failed to connect to remote browser: {}", e)))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle))
    }
}

#[async_trait]
impl RendererFactory for ChromiumFactory {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RenderError> {
        let (browser, handler) = self.launch().await?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // Set realistic user agent before any navigation
        if let Err(e) = page
            .execute(SetUserAgentOverrideParams::new(
                RENDERER_USER_AGENT.to_string(),
            ))
            .await
        {
            debug!("Could not override user agent: {}", e);
        }

        Ok(Box::new(ChromiumRenderer {
            browser,
            page,
            handler,
            timeout: self.config.timeout,
        }))
    }
}

/// One live Chromium process driving a single page.
pub struct ChromiumRenderer {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    timeout: u64,
}

impl ChromiumRenderer {
    async fn document_height(&self) -> Result<i64, RenderError> {
        let result = self
            .page
            .evaluate("document.body.scrollHeight".to_string())
            .await
            .map_err(|e| RenderError::Evaluation(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| RenderError::Evaluation(e.to_string()))
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn goto(&mut self, url: &str) -> Result<(), RenderError> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|reason| RenderError::Navigation {
                url: url.to_string(),
                reason,
            })?;

        let nav_timeout = Duration::from_secs(self.timeout);
        tokio::time::timeout(nav_timeout, self.page.execute(nav_params))
            .await
            .map_err(|_| RenderError::Timeout(self.timeout))?
            .map_err(|e| RenderError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }

    async fn scroll_to_stable(&mut self) -> Result<(), RenderError> {
        let mut last_height = self.document_height().await?;
        for _ in 0..MAX_SCROLL_ROUNDS {
            self.page
                .evaluate("window.scrollTo(0, document.body.scrollHeight)".to_string())
                .await
                .map_err(|e| RenderError::Evaluation(e.to_string()))?;
            tokio::time::sleep(SCROLL_PAUSE).await;

            let new_height = self.document_height().await?;
            if new_height == last_height {
                return Ok(());
            }
            last_height = new_height;
        }
        warn!("Page still growing after {} scroll rounds", MAX_SCROLL_ROUNDS);
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page
            .content()
            .await
            .map_err(|e| RenderError::Evaluation(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}
