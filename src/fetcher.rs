use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::session::{BrowserSession, SessionLost};

/// Where the visible name of a matched anchor comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    /// Text of the `span` elements inside the anchor, falling back to the
    /// anchor text when there are none.
    NestedSpan,
    AnchorText,
}

/// A selector tied to the aggregator's current markup. Class names carry a
/// build hash suffix, hence the prefix matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorProfile {
    pub name: &'static str,
    pub selector: &'static str,
    pub label: LabelSource,
}

pub const ROOT_CATALOG: SelectorProfile = SelectorProfile {
    name: "root-catalog",
    selector: "[class^=RootCatalog_list] li a",
    label: LabelSource::NestedSpan,
};

pub const NAVIGATION_TREE: SelectorProfile = SelectorProfile {
    name: "navigation-tree",
    selector: "[class^=NavigationTreeItem_root] a",
    label: LabelSource::AnchorText,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub name: String,
    pub href: String,
}

/// Navigates `session` to `url` and extracts the profile's links. A page that
/// fails to load is logged and yields no links; a session that died on the way
/// is reported as [`SessionLost`].
pub async fn fetch_links(
    session: &mut dyn BrowserSession,
    url: &Url,
    profile: SelectorProfile,
) -> Result<Vec<Link>, SessionLost> {
    let loaded = match session.navigate(url).await {
        Ok(()) => session.page_source().await.context("read page"),
        Err(err) => Err(err),
    };

    let html = match loaded {
        Ok(html) => html,
        Err(err) => {
            if !session.is_alive().await {
                tracing::error!(%url, profile = profile.name, ?err, "browser session lost");
                return Err(SessionLost {
                    url: url.to_string(),
                });
            }
            tracing::error!(%url, profile = profile.name, ?err, "page load failed");
            return Ok(Vec::new());
        }
    };

    match extract_links(&html, profile) {
        Ok(links) => Ok(links),
        Err(err) => {
            tracing::error!(%url, profile = profile.name, ?err, "link extraction failed");
            Ok(Vec::new())
        }
    }
}

/// Matched anchors in document order, without dedup or href validation.
pub fn extract_links(html: &str, profile: SelectorProfile) -> anyhow::Result<Vec<Link>> {
    let selector = parse_selector(profile.selector)?;
    let span = parse_selector("span")?;
    let document = Html::parse_document(html);

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            tracing::debug!(profile = profile.name, "anchor without href skipped");
            continue;
        };

        let name = match profile.label {
            LabelSource::NestedSpan => {
                let label = anchor
                    .select(&span)
                    .map(|el| element_text(&el))
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if label.is_empty() {
                    element_text(&anchor)
                } else {
                    label
                }
            }
            LabelSource::AnchorText => element_text(&anchor),
        };

        links.push(Link {
            name,
            href: href.to_owned(),
        });
    }

    Ok(links)
}

fn parse_selector(selector: &str) -> anyhow::Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow::anyhow!("parse selector {selector:?}: {err:?}"))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
