use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use url::Url;

use crate::cli::Cli;
use crate::model::StoreTarget;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub grid_url: Url,
    pub threads: usize,
    pub stores_path: PathBuf,
    pub output_dir: PathBuf,
    pub source: String,
}

impl Config {
    pub fn from_cli(cli: Cli) -> anyhow::Result<Self> {
        if cli.base_url.cannot_be_a_base() {
            anyhow::bail!("base url cannot be used as a base: {}", cli.base_url);
        }
        let source = cli.source.trim().to_owned();
        if source.is_empty() {
            anyhow::bail!("output source name is empty");
        }

        Ok(Self {
            base_url: with_trailing_slash(cli.base_url),
            grid_url: cli.grid_url,
            threads: usize::from(cli.threads),
            stores_path: PathBuf::from(cli.stores),
            output_dir: PathBuf::from(cli.out),
            source,
        })
    }

    pub fn load_store_targets(&self) -> anyhow::Result<Vec<StoreTarget>> {
        load_store_targets(&self.stores_path, &self.base_url)
    }
}

/// Joins resolve relative to the last path segment, so the base must end with
/// a slash to keep its path.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub fn load_store_targets(path: &Path, base_url: &Url) -> anyhow::Result<Vec<StoreTarget>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read store configuration: {}", path.display()))?;
    parse_store_targets(&raw, base_url)
        .with_context(|| format!("parse store configuration: {}", path.display()))
}

/// Parses `{ "<store>": ["<sid>", ...] }` into targets ordered by site id.
/// A site id listed more than once keeps its first store.
pub fn parse_store_targets(raw: &str, base_url: &Url) -> anyhow::Result<Vec<StoreTarget>> {
    let stores: BTreeMap<String, Vec<String>> =
        serde_json::from_str(raw).context("deserialize store map")?;

    let mut by_site_id: BTreeMap<String, StoreTarget> = BTreeMap::new();
    for (name, site_ids) in stores {
        for site_id in site_ids {
            if let Some(existing) = by_site_id.get(&site_id) {
                tracing::warn!(
                    sid = %site_id,
                    kept = %existing.name,
                    dropped = %name,
                    "duplicate site id in store configuration"
                );
                continue;
            }
            let target = StoreTarget::new(base_url, name.as_str(), site_id.as_str())
                .with_context(|| format!("build entry url for {name}({site_id})"))?;
            by_site_id.insert(site_id, target);
        }
    }

    if by_site_id.is_empty() {
        anyhow::bail!("store configuration lists no site ids");
    }

    Ok(by_site_id.into_values().collect())
}
