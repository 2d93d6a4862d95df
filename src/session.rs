use anyhow::Context as _;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt as _;
use tokio::task::JoinHandle;
use url::Url;

pub const WINDOW_WIDTH: i64 = 1920;
pub const WINDOW_HEIGHT: i64 = 1080;

/// The remote browser went away; nothing more can be loaded through it.
#[derive(Debug, thiserror::Error)]
#[error("browser session lost while loading {url}")]
pub struct SessionLost {
    pub url: String,
}

/// A navigable browser handle owned by exactly one worker.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &Url) -> anyhow::Result<()>;
    async fn page_source(&mut self) -> anyhow::Result<String>;
    /// Checked after a failed load to tell a bad page from a dead session.
    async fn is_alive(&mut self) -> bool;
    async fn close(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<Box<dyn BrowserSession>>;
}

/// Connects to a remote Chromium over the DevTools protocol.
#[derive(Debug, Clone)]
pub struct RemoteBrowserProvider {
    endpoint: Url,
}

impl RemoteBrowserProvider {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl SessionProvider for RemoteBrowserProvider {
    async fn acquire(&self) -> anyhow::Result<Box<dyn BrowserSession>> {
        let (browser, mut handler) = Browser::connect(self.endpoint.as_str())
            .await
            .with_context(|| format!("connect to remote browser: {}", self.endpoint))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(err) => {
                events.abort();
                return Err(err);
            }
        };

        Ok(Box::new(RemoteBrowserSession {
            browser,
            page,
            events,
        }))
    }
}

async fn open_page(browser: &Browser) -> anyhow::Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .context("open browser page")?;
    page.execute(SetDeviceMetricsOverrideParams::new(
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        1.0,
        false,
    ))
    .await
    .context("set window size")?;
    Ok(page)
}

pub struct RemoteBrowserSession {
    browser: Browser,
    page: Page,
    events: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for RemoteBrowserSession {
    async fn navigate(&mut self, url: &Url) -> anyhow::Result<()> {
        self.page
            .goto(url.as_str())
            .await
            .with_context(|| format!("navigate to {url}"))?;
        Ok(())
    }

    async fn page_source(&mut self) -> anyhow::Result<String> {
        self.page.content().await.context("read page source")
    }

    async fn is_alive(&mut self) -> bool {
        !self.events.is_finished() && self.page.url().await.is_ok()
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        let Self {
            browser,
            page,
            events,
        } = *self;
        let result = page.close().await.context("close browser page");
        drop(browser);
        events.abort();
        result
    }
}
