use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::db;
use crate::fetch;
use crate::settings::Settings;
use crate::source::{self, SourceEntry, SourceFormat};
use crate::transform::{self, TransformStats};

/// Outcome of a successful build.
#[derive(Debug)]
pub struct Summary {
    pub inserted: usize,
    pub db_path: PathBuf,
    pub stats: TransformStats,
}

/// Download → parse → build. The downloaded file is gone before the store
/// is touched, and also on any early return.
pub async fn run(settings: &Settings) -> Result<Summary> {
    run_in(settings, &std::env::temp_dir()).await
}

/// [`run`] with the download placed in `scratch`.
async fn run_in(settings: &Settings, scratch: &Path) -> Result<Summary> {
    let format = settings.source_format();
    format.ensure_available()?;

    println!("Downloading Alar dataset...");
    let client = fetch::client()?;
    let download = fetch::download(&client, &settings.url, format.extension(), scratch).await?;

    let entries = parse(download.path(), format)?;
    download.close().context("Failed to remove downloaded file")?;

    build(&entries, &settings.db_path())
}

pub fn parse(path: &Path, format: SourceFormat) -> Result<Vec<SourceEntry>> {
    println!("Parsing {format}...");
    let entries = source::read_entries(path, format)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Decoded {} entries", entries.len());
    Ok(entries)
}

/// Normalize `entries` and upsert them into the store at `db_path`.
pub fn build(entries: &[SourceEntry], db_path: &Path) -> Result<Summary> {
    println!("Building SQLite...");
    let (records, stats) = transform::transform(entries);
    info!(
        seen = stats.seen,
        kept = stats.kept,
        missing_word = stats.missing_word,
        missing_meaning = stats.missing_meaning,
        "Normalized entries"
    );

    let conn = db::connect(db_path)?;
    db::init_schema(&conn)?;
    let inserted = db::upsert_entries(&conn, &records)?;
    drop(conn);

    let db_path = db_path
        .canonicalize()
        .unwrap_or_else(|_| db_path.to_path_buf());
    Ok(Summary {
        inserted,
        db_path,
        stats,
    })
}
