use url::Url;

use crate::fetcher::{self, Link, NAVIGATION_TREE, ROOT_CATALOG};
use crate::model::{Category, StoreTarget};
use crate::session::{BrowserSession, SessionLost};

/// Builds two-level category trees over one exclusively owned session.
pub struct StoreCrawler {
    session: Box<dyn BrowserSession>,
    base_url: Url,
}

impl StoreCrawler {
    pub fn new(session: Box<dyn BrowserSession>, base_url: Url) -> Self {
        Self { session, base_url }
    }

    /// Attaches the store's top-level categories and their sub-categories.
    /// Failed pages leave the affected branch empty; a lost session stops the
    /// crawl.
    pub async fn crawl(&mut self, target: &mut StoreTarget) -> Result<(), SessionLost> {
        let top_level =
            fetcher::fetch_links(self.session.as_mut(), &target.entry_url, ROOT_CATALOG).await?;
        for category in self.categories_from(top_level) {
            target.add_category(category);
        }
        tracing::info!(
            store = %target.name,
            sid = %target.site_id,
            count = target.categories().len(),
            "collected top-level categories"
        );

        let store = target.name.clone();
        let sid = target.site_id.clone();
        for parent in target.categories_mut() {
            let sub_level =
                fetcher::fetch_links(self.session.as_mut(), &parent.link, NAVIGATION_TREE).await?;
            for child in self.categories_from(sub_level) {
                parent.add_child(child);
            }
            tracing::info!(
                %store,
                %sid,
                category = %parent.name,
                count = parent.children().len(),
                "collected sub-categories"
            );
        }

        tracing::info!(%store, %sid, "store crawled");
        Ok(())
    }

    pub fn into_session(self) -> Box<dyn BrowserSession> {
        self.session
    }

    fn categories_from(&self, links: Vec<Link>) -> Vec<Category> {
        links
            .into_iter()
            .filter_map(
                |link| match Category::from_href(&self.base_url, link.name.as_str(), &link.href) {
                    Ok(category) => Some(category),
                    Err(err) => {
                        tracing::warn!(
                            name = %link.name,
                            href = %link.href,
                            %err,
                            "unusable category link"
                        );
                        None
                    }
                },
            )
            .collect()
    }
}
