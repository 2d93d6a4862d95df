use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use store_taxonomy::session::{BrowserSession, SessionProvider};
use url::Url;

/// What the stub browser does for one URL.
#[allow(dead_code)]
pub enum Page {
    Html(String),
    NavigationError,
    /// The browser connection drops while loading this URL.
    Disconnect,
    Hang,
}

pub type Site = dyn Fn(&Url) -> Page + Send + Sync;

pub struct StubProvider {
    site: Arc<Site>,
    failing_acquisitions: AtomicUsize,
    pub acquired: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(site: impl Fn(&Url) -> Page + Send + Sync + 'static) -> Self {
        Self {
            site: Arc::new(site),
            failing_acquisitions: AtomicUsize::new(0),
            acquired: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The first `count` acquisitions fail.
    #[allow(dead_code)]
    pub fn failing_first(self, count: usize) -> Self {
        self.failing_acquisitions.store(count, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl SessionProvider for StubProvider {
    async fn acquire(&self) -> anyhow::Result<Box<dyn BrowserSession>> {
        let should_fail = self
            .failing_acquisitions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            anyhow::bail!("stub endpoint refused the session");
        }

        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            site: Arc::clone(&self.site),
            current: None,
            alive: true,
            closed: Arc::clone(&self.closed),
        }))
    }
}

struct StubSession {
    site: Arc<Site>,
    current: Option<String>,
    alive: bool,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn navigate(&mut self, url: &Url) -> anyhow::Result<()> {
        if !self.alive {
            anyhow::bail!("stub session is closed");
        }
        let page = (self.site)(url);
        match page {
            Page::Html(html) => {
                self.current = Some(html);
                Ok(())
            }
            Page::NavigationError => anyhow::bail!("stub navigation error: {url}"),
            Page::Disconnect => {
                self.alive = false;
                anyhow::bail!("stub connection reset: {url}")
            }
            Page::Hang => std::future::pending::<anyhow::Result<()>>().await,
        }
    }

    async fn page_source(&mut self) -> anyhow::Result<String> {
        Ok(self.current.clone().unwrap_or_default())
    }

    async fn is_alive(&mut self) -> bool {
        self.alive
    }

    async fn close(self: Box<Self>) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn root_catalog_page(links: &[(&str, &str)]) -> Page {
    let items = links
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{href}"><span>{name}</span></a></li>"#))
        .collect::<String>();
    Page::Html(format!(
        r#"<!doctype html><html><body><ul class="RootCatalog_list__a1">{items}</ul></body></html>"#
    ))
}

pub fn navigation_tree_page(links: &[(&str, &str)]) -> Page {
    let items = links
        .iter()
        .map(|(name, href)| {
            format!(r#"<div class="NavigationTreeItem_root__b2"><a href="{href}">{name}</a></div>"#)
        })
        .collect::<String>();
    Page::Html(format!("<!doctype html><html><body>{items}</body></html>"))
}

pub fn is_store_entry(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| key == "sid")
}
