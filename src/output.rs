use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Local};
use tokio::fs;

use crate::model::StoreRecord;

pub const FILE_TIMESTAMP_FORMAT: &str = "%d-%m-%Y-%H-%M";

/// Keys records by site id. A later record replaces an earlier one with the
/// same site id.
pub fn build_document(records: Vec<StoreRecord>) -> BTreeMap<String, StoreRecord> {
    let mut document = BTreeMap::new();
    for record in records {
        if let Some(previous) = document.insert(record.sid.clone(), record) {
            tracing::warn!(sid = %previous.sid, "duplicate site id in results; keeping the last one");
        }
    }
    document
}

pub fn output_path(out_dir: &Path, source: &str, now: DateTime<Local>) -> PathBuf {
    out_dir.join(format!("{source}-{}.json", now.format(FILE_TIMESTAMP_FORMAT)))
}

/// Writes the document to `<out_dir>/<source>-<timestamp>.json` and returns
/// the path.
pub async fn write(
    out_dir: &Path,
    source: &str,
    records: Vec<StoreRecord>,
) -> anyhow::Result<PathBuf> {
    let path = output_path(out_dir, source, Local::now());
    let document = build_document(records);
    write_json_atomic(&path, &document)
        .await
        .with_context(|| format!("write category document: {}", path.display()))?;
    tracing::info!(path = %path.display(), stores = document.len(), "category document written");
    Ok(path)
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create output dir: {}", parent.display()))?;

    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));

    let result = match fs::write(&tmp_path, &data).await {
        Ok(()) => fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("move document into place: {}", path.display())),
        Err(err) => Err::<(), _>(err).with_context(|| format!("write staging file: {}", tmp_path.display())),
    };
    if result.is_err() {
        if let Err(err) = fs::remove_file(&tmp_path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %tmp_path.display(), ?err, "staging file left behind");
            }
        }
    }
    result
}
