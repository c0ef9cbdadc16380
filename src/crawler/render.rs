//! Rendering session backed by a headless Chromium
//!
//! A session owns one browser tab. Each fetch navigates that tab, waits for
//! the page to settle, applies the target's scroll policy and returns the
//! rendered document. Navigations on one session run one at a time. The
//! session must be closed explicitly; a launched browser is shut down, a
//! remote one only loses its tab.

use crate::config::{FetchConfig, RenderConfig, RenderMode};
use crate::crawler::fetcher::{FetchResult, ScrollPolicy};
use crate::{CorpusError, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const DOCUMENT_HEIGHT: &str = "document.body.scrollHeight";

struct OpenSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    launched: bool,
}

/// One browser tab held open for the lifetime of a unit
pub struct RenderSession {
    inner: Mutex<Option<OpenSession>>,
    navigation_timeout: Duration,
    settle: Duration,
    scroll_wait: Duration,
    max_scroll_rounds: u32,
}

impl RenderSession {
    /// Launches a browser, or connects to `render.endpoint` when set, and
    /// opens a blank tab
    pub async fn open(render: &RenderConfig, fetch: &FetchConfig) -> Result<Self> {
        let launched = render.endpoint.is_none();
        let (mut browser, mut handler) = match &render.endpoint {
            Some(endpoint) => {
                tracing::info!("Connecting to remote browser at {}", endpoint);
                Browser::connect(endpoint.as_str()).await.map_err(|e| {
                    CorpusError::Render(format!("Failed to connect to {}: {}", endpoint, e))
                })?
            }
            None => {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(fetch.timeout())
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage");
                if render.render_mode == RenderMode::Headed {
                    builder = builder.with_head();
                }
                if let Some(executable) = &render.executable {
                    builder = builder.chrome_executable(executable);
                }
                let config = builder.build().map_err(CorpusError::Render)?;
                Browser::launch(config)
                    .await
                    .map_err(|e| CorpusError::Render(format!("Failed to launch browser: {}", e)))?
            }
        };

        // Drive browser events until the connection goes away
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match open_tab(&browser, &fetch.user_agent).await {
            Ok(page) => page,
            Err(e) => {
                if launched {
                    let _ = browser.close().await;
                    let _ = browser.wait().await;
                }
                handler.abort();
                return Err(e);
            }
        };

        Ok(Self {
            inner: Mutex::new(Some(OpenSession {
                browser,
                page,
                handler,
                launched,
            })),
            navigation_timeout: fetch.timeout(),
            settle: render.settle(),
            scroll_wait: render.scroll_wait(),
            max_scroll_rounds: render.max_scroll_rounds,
        })
    }

    /// Navigates the tab to `url` and returns the rendered document
    pub async fn render(&self, url: &Url, scroll: ScrollPolicy) -> FetchResult {
        let guard = self.inner.lock().await;
        let Some(session) = guard.as_ref() else {
            return FetchResult::RenderError {
                error: format!("Session already closed before {}", url),
            };
        };

        match self.navigate(&session.page, url, scroll).await {
            Ok(body) => FetchResult::Success {
                final_url: url.to_string(),
                status_code: 200,
                body,
            },
            Err(error) => {
                tracing::warn!("Render failed for {}: {}", url, error);
                FetchResult::RenderError { error }
            }
        }
    }

    async fn navigate(
        &self,
        page: &Page,
        url: &Url,
        scroll: ScrollPolicy,
    ) -> std::result::Result<String, String> {
        tokio::time::timeout(self.navigation_timeout, page.goto(url.as_str()))
            .await
            .map_err(|_| "Navigation timeout".to_string())?
            .map_err(|e| e.to_string())?;
        tokio::time::sleep(self.settle).await;

        let mut progress = ScrollProgress::new(scroll, self.max_scroll_rounds);
        let mut height = measure(page, &progress).await?;
        while progress.next_round(height) {
            scroll_to_bottom(page).await?;
            tokio::time::sleep(self.scroll_wait).await;
            height = measure(page, &progress).await?;
        }
        tracing::debug!("{} rendered after {} scroll rounds", url, progress.rounds);

        page.content().await.map_err(|e| e.to_string())
    }

    /// Closes the tab and, for a launched browser, the browser process
    ///
    /// Safe to call more than once.
    pub async fn close(&self) {
        let Some(session) = self.inner.lock().await.take() else {
            return;
        };
        let OpenSession {
            mut browser,
            page,
            handler,
            launched,
        } = session;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab: {}", e);
        }
        if launched {
            if let Err(e) = browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                tracing::warn!("Browser did not exit cleanly: {}", e);
            }
        }
        handler.abort();
        tracing::debug!("Render session closed");
    }
}

/// Decides, round by round, whether a page gets scrolled again
#[derive(Debug)]
struct ScrollProgress {
    policy: ScrollPolicy,
    max_rounds: u32,
    rounds: u32,
    last_height: Option<f64>,
}

impl ScrollProgress {
    fn new(policy: ScrollPolicy, max_rounds: u32) -> Self {
        Self {
            policy,
            max_rounds,
            rounds: 0,
            last_height: None,
        }
    }

    /// Only `UntilStable` looks at the document height
    fn tracks_height(&self) -> bool {
        self.policy == ScrollPolicy::UntilStable
    }

    /// Takes the height measured since the last round and returns true if
    /// another scroll round should run
    fn next_round(&mut self, height: Option<f64>) -> bool {
        let more = match self.policy {
            ScrollPolicy::None => false,
            ScrollPolicy::Fixed(rounds) => self.rounds < rounds,
            ScrollPolicy::UntilStable => {
                let grew = match (self.last_height, height) {
                    (Some(last), Some(now)) => now > last,
                    (None, _) => true,
                    (Some(_), None) => false,
                };
                self.last_height = height;
                grew && self.rounds < self.max_rounds
            }
        };
        if more {
            self.rounds += 1;
        }
        more
    }
}

async fn measure(
    page: &Page,
    progress: &ScrollProgress,
) -> std::result::Result<Option<f64>, String> {
    if progress.tracks_height() {
        document_height(page).await.map(Some)
    } else {
        Ok(None)
    }
}

async fn open_tab(browser: &Browser, user_agent: &str) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| CorpusError::Render(format!("Failed to open tab: {}", e)))?;
    page.set_user_agent(user_agent)
        .await
        .map_err(|e| CorpusError::Render(format!("Failed to set user agent: {}", e)))?;
    Ok(page)
}

async fn scroll_to_bottom(page: &Page) -> std::result::Result<(), String> {
    page.evaluate(SCROLL_TO_BOTTOM)
        .await
        .map(|_| ())
        .map_err(|e| format!("Scroll failed: {}", e))
}

async fn document_height(page: &Page) -> std::result::Result<f64, String> {
    page.evaluate(DOCUMENT_HEIGHT)
        .await
        .map_err(|e| format!("Height probe failed: {}", e))?
        .into_value::<f64>()
        .map_err(|e| format!("Height probe returned no number: {}", e))
}
