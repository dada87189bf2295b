//! Headless Chromium backend built on chromiumoxide.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::CloseParams;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::StreamExt;
use tokio::task::JoinHandle;

use crate::config::{LoadOptions, PrintOptions};
use crate::render::{BackendError, DomSnapshot, RenderBackend, RenderSession};

const MM_PER_INCH: f64 = 25.4;
const IDLE_POLL: Duration = Duration::from_millis(250);
const IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Lazy loading would leave images unfetched in a headless print.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-features=LazyImageLoading,LazyFrameLoading",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--hide-scrollbars",
];

const RESOURCE_COUNT_JS: &str = "performance.getEntriesByType('resource').length";

const READY_STATE_JS: &str = "document.readyState";

/// Forces every image to load eagerly, nudges scroll-driven loaders and waits
/// for decode so the print does not catch half-loaded pictures.
const SETTLE_IMAGES_JS: &str = r#"(async () => {
  for (const img of document.querySelectorAll('img')) {
    try { img.loading = 'eager'; img.decoding = 'sync'; } catch (_) {}
  }
  window.scrollTo(0, document.body.scrollHeight);
  await new Promise(r => requestAnimationFrame(() => requestAnimationFrame(r)));
  window.scrollTo(0, 0);
  await Promise.all(Array.from(document.images).map(img => {
    if (img.complete && img.naturalWidth > 0) return Promise.resolve();
    return (img.decode ? img.decode() : Promise.resolve()).catch(() => {});
  }));
  return document.images.length;
})()"#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromiumSettings {
    /// Explicit browser binary; autodetected when unset.
    pub executable: Option<PathBuf>,
    pub extra_args: Vec<String>,
}

pub struct ChromiumBackend {
    browser: Browser,
    closed: AtomicBool,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumBackend {
    /// Launches one headless browser for the whole run.
    pub async fn launch(settings: &ChromiumSettings) -> Result<Arc<Self>, BackendError> {
        let mut builder = BrowserConfig::builder().args(LAUNCH_ARGS.iter().copied());
        if let Some(path) = &settings.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in &settings.extra_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(BackendError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BackendError::Launch(e.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        engine_info!("Chromium launched");

        Ok(Arc::new(Self {
            browser,
            closed: AtomicBool::new(false),
            handler: Mutex::new(Some(handler_task)),
        }))
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, BackendError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BackendError::Closed);
        }
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BackendError::Session(e.to_string()))?;
        Ok(Box::new(ChromiumSession { page: Some(page) }))
    }

    async fn shutdown(&self) -> Result<(), BackendError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let result = match self.browser.execute(CloseParams::default()).await {
            Ok(_) => {
                engine_info!("Chromium shut down");
                Ok(())
            }
            Err(e) => {
                engine_warn!("Chromium close failed: {}", e);
                Err(BackendError::Session(e.to_string()))
            }
        };
        let handler = self.handler.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handler) = handler {
            handler.abort();
        }
        result
    }
}

/// One browser tab. The page is closed explicitly through [`RenderSession::close`];
/// a session dropped without closing closes its tab in the background.
struct ChromiumSession {
    page: Option<Page>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, BackendError> {
        self.page.as_ref().ok_or(BackendError::Closed)
    }

    async fn wait_for_network_idle(&self, grace: Duration) {
        let Ok(page) = self.page() else {
            return;
        };
        let deadline = Instant::now() + grace;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        while Instant::now() < deadline {
            let ready = page
                .evaluate(READY_STATE_JS)
                .await
                .ok()
                .and_then(|r| r.into_value::<String>().ok());
            let count = page
                .evaluate(RESOURCE_COUNT_JS)
                .await
                .ok()
                .and_then(|r| r.into_value::<u64>().ok());

            if count != last_count {
                last_count = count;
                quiet_since = Instant::now();
            } else if ready.as_deref() == Some("complete")
                && quiet_since.elapsed() >= IDLE_QUIET_PERIOD
            {
                return;
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
        engine_debug!("network idle grace of {:?} expired", grace);
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn load(&mut self, url: &str, options: &LoadOptions) -> Result<DomSnapshot, BackendError> {
        let page = self.page()?;
        match tokio::time::timeout(options.navigation_timeout, page.goto(url)).await {
            Err(_) => return Err(BackendError::NavigationTimeout(options.navigation_timeout)),
            Ok(Err(e)) => return Err(BackendError::Navigation(e.to_string())),
            Ok(Ok(_)) => {}
        }

        self.wait_for_network_idle(options.network_idle_grace).await;

        let page = self.page()?;
        let html = page
            .content()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;
        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());
        Ok(DomSnapshot {
            url: final_url,
            html,
        })
    }

    async fn print_to_pdf(
        &mut self,
        html: &str,
        options: &PrintOptions,
    ) -> Result<Vec<u8>, BackendError> {
        let page = self.page()?;
        page.set_content(html)
            .await
            .map_err(|e| BackendError::Print(e.to_string()))?;
        if let Err(e) = page.evaluate(SETTLE_IMAGES_JS).await {
            engine_debug!("image settle script failed: {}", e);
        }

        let params = PrintToPdfParams {
            print_background: Some(options.print_background),
            paper_width: Some(options.paper_width_mm / MM_PER_INCH),
            paper_height: Some(options.paper_height_mm / MM_PER_INCH),
            margin_top: Some(options.margin_vertical_mm / MM_PER_INCH),
            margin_bottom: Some(options.margin_vertical_mm / MM_PER_INCH),
            margin_left: Some(options.margin_horizontal_mm / MM_PER_INCH),
            margin_right: Some(options.margin_horizontal_mm / MM_PER_INCH),
            prefer_css_page_size: Some(false),
            ..Default::default()
        };
        page.pdf(params)
            .await
            .map_err(|e| BackendError::Print(e.to_string()))
    }

    async fn close(mut self: Box<Self>) -> Result<(), BackendError> {
        if let Some(page) = self.page.take() {
            page.close()
                .await
                .map_err(|e| BackendError::Session(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        engine_warn!("background tab close failed: {}", e);
                    }
                });
            }
        }
    }
}

/// Whether a Chromium binary can be found without installing one.
pub fn detect_browser() -> Result<(), BackendError> {
    BrowserConfig::builder()
        .build()
        .map(|_| ())
        .map_err(BackendError::Launch)
}
