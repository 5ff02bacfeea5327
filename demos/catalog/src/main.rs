use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::{info, warn};

use flo_core::{Done, TaskFn, TaskRef, make_async_named, map_limit, serial};
use flo_model::Limit;
use flo_observe::{LoggerConfig, logger_init};

const ENV_LIMIT: &str = "FLO_LIMIT";

#[derive(Debug, Clone, Deserialize)]
struct Cat {
    name: String,
    price: u64,
}

/// Value threaded through the per-file chain.
#[derive(Debug)]
enum Record {
    Raw(String),
    Cat(Cat),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger_init(&LoggerConfig::from_env()?)?;

    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("cats"));
    let limit = Limit::from_env(ENV_LIMIT)?;

    let files = json_files(&dir).await?;
    info!(dir = %dir.display(), files = files.len(), %limit, "loading catalog");

    let settled = map_limit(files.clone(), limit, load_cat).await;

    let mut total = 0;
    for (path, cat) in files.iter().zip(&settled.results) {
        match cat {
            Some(cat) => {
                total += cat.price;
                info!(file = %path.display(), name = %cat.name, price = cat.price, "loaded");
            }
            None => warn!(file = %path.display(), "skipped"),
        }
    }

    if let Some(err) = &settled.error {
        warn!(failed = settled.failed().count(), error = %format!("{err:#}"), "catalog is incomplete");
    }
    info!(total, "catalog value");
    Ok(())
}

async fn json_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("read dir {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `map` worker: runs the read → parse chain for one file.
fn load_cat(path: PathBuf, done: Done<Cat, anyhow::Error>) {
    tokio::spawn(async move {
        done.settle(read_cat(path).await);
    });
}

async fn read_cat(path: PathBuf) -> anyhow::Result<Cat> {
    let shown = path.display().to_string();

    let chain: Vec<TaskRef<Option<Record>, Record, anyhow::Error>> = vec![
        TaskFn::from_future("read", move |_| async move {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            Ok::<_, anyhow::Error>(Record::Raw(raw))
        })
        .boxed(),
        make_async_named("parse", |input: Option<Record>| -> anyhow::Result<Record> {
            match input {
                Some(Record::Raw(raw)) => Ok(Record::Cat(serde_json::from_str(&raw)?)),
                other => bail!("parse expects raw text, got {other:?}"),
            }
        })
        .boxed(),
    ];

    match serial(chain).await.with_context(|| shown.clone())? {
        Some(Record::Cat(cat)) => Ok(cat),
        other => bail!("{shown}: chain ended with {other:?}"),
    }
}
