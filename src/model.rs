use serde::{Deserialize, Serialize};
use url::{Position, Url};

/// One taxonomy node. Top-level nodes own their sub-categories; sub-level
/// nodes never get children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub link: Url,
    children: Vec<Category>,
}

impl Category {
    /// Resolves `href` against the base URL. Relative paths land under the base
    /// origin; absolute hrefs are kept as they are.
    pub fn from_href(
        base_url: &Url,
        name: impl Into<String>,
        href: &str,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            name: name.into(),
            link: base_url.join(href)?,
            children: Vec::new(),
        })
    }

    pub fn add_child(&mut self, child: Category) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Category] {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct StoreTarget {
    pub name: String,
    pub site_id: String,
    pub entry_url: Url,
    categories: Vec<Category>,
}

impl StoreTarget {
    pub fn new(
        base_url: &Url,
        name: impl Into<String>,
        site_id: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let name = name.into();
        let site_id = site_id.into();
        let entry_url = base_url.join(&format!("{name}?sid={site_id}"))?;
        Ok(Self {
            name,
            site_id,
            entry_url,
            categories: Vec::new(),
        })
    }

    pub fn add_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn categories_mut(&mut self) -> &mut [Category] {
        &mut self.categories
    }

    /// Flattens the two-level tree into one entry per sub-category. Top-level
    /// links are dropped.
    pub fn to_record(&self, base_url: &Url) -> StoreRecord {
        let categories = self
            .categories
            .iter()
            .flat_map(|parent| {
                parent.children().iter().map(|child| SubCategoryRecord {
                    category: parent.name.clone(),
                    sub_category: child.name.clone(),
                    link: display_link(base_url, &child.link),
                })
            })
            .collect();

        StoreRecord {
            store: self.name.clone(),
            sid: self.site_id.clone(),
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub store: String,
    pub sid: String,
    pub categories: Vec<SubCategoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategoryRecord {
    pub category: String,
    #[serde(rename = "subCategory")]
    pub sub_category: String,
    pub link: String,
}

/// Links under the base URL are written relative to it; other links on the
/// same origin keep their absolute path, foreign links stay absolute.
fn display_link(base_url: &Url, link: &Url) -> String {
    if link.origin() != base_url.origin() {
        return link.to_string();
    }
    let tail = &link[Position::BeforePath..];
    match base_url.path() {
        "/" => tail.to_owned(),
        base_path => tail.strip_prefix(base_path).unwrap_or(tail).to_owned(),
    }
}
