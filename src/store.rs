//! Yearly NDJSON partitions with ID-based deduplication.
//!
//! Posts are grouped by the calendar year of their timestamp, localized to
//! Asia/Tokyo, and each year is persisted as `posts_{year}.jsonl`, one JSON
//! record per line. Merging a new batch loads the existing partition, appends
//! the batch, and keeps the first record per ID, so a post fetched again
//! keeps its stored form (old wins).

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, FixedOffset};
use tracing::{debug, error, info, warn};

use crate::model::Post;

/// Outcome of a [`save_by_year`] run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveSummary {
    /// Partitions merged and written.
    pub years_written: usize,
    /// Posts dropped because their timestamp could not be parsed.
    pub skipped: usize,
}

/// Timestamp format the API uses: ISO-8601 with a trailing numeric offset.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

fn tokyo() -> FixedOffset {
    // Japan observes no DST; a fixed +09:00 offset is exact.
    FixedOffset::east_opt(9 * 3600).expect("static offset")
}

/// Parse a post timestamp and localize it to Asia/Tokyo.
///
/// # Errors
///
/// Returns an error if the timestamp does not match the API format.
pub fn tokyo_datetime(timestamp: &str) -> Result<DateTime<FixedOffset>> {
    let parsed = DateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .with_context(|| format!("unparseable timestamp: {timestamp:?}"))?;
    Ok(parsed.with_timezone(&tokyo()))
}

/// Calendar year a post belongs to, localized to Asia/Tokyo.
///
/// # Errors
///
/// Returns an error if the timestamp does not match the API format.
pub fn partition_year(timestamp: &str) -> Result<i32> {
    Ok(tokyo_datetime(timestamp)?.year())
}

fn partition_path(dir: &Path, year: i32) -> PathBuf {
    dir.join(format!("posts_{year}.jsonl"))
}

/// Load every record of a partition file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is not a valid
/// post record.
pub async fn load_partition(path: &Path) -> Result<Vec<Post>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read partition: {}", path.display()))?;

    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .with_context(|| format!("Malformed record in {}", path.display()))
        })
        .collect()
}

async fn write_partition(path: &Path, posts: &[Post]) -> Result<()> {
    let mut out = String::new();
    for post in posts {
        out.push_str(&serde_json::to_string(post).context("Failed to serialize post")?);
        out.push('\n');
    }

    tokio::fs::write(path, out)
        .await
        .with_context(|| format!("Failed to write partition: {}", path.display()))
}

/// Keep the first record per distinct ID, preserving order.
fn dedup_by_id(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(post.id.clone()))
        .collect()
}

/// Merge `new_posts` into the partition for `year` and write it back.
///
/// Existing records come first, so a duplicate ID keeps its stored form.
/// Returns the number of records in the merged partition.
///
/// # Errors
///
/// Returns an error if the existing partition cannot be loaded or the merged
/// set cannot be written.
pub async fn merge_and_save(dir: &Path, year: i32, new_posts: &[Post]) -> Result<usize> {
    let path = partition_path(dir, year);

    let mut merged = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        load_partition(&path).await?
    } else {
        Vec::new()
    };
    merged.extend(new_posts.iter().cloned());

    let deduped = dedup_by_id(merged);
    write_partition(&path, &deduped).await?;
    Ok(deduped.len())
}

/// Group posts by Tokyo calendar year and merge each group into its
/// partition, sequentially in ascending year order.
///
/// Each year is an isolated unit of work: a failure saving one year is
/// logged and does not stop the remaining years. Posts whose timestamp
/// cannot be parsed are skipped with a warning and counted.
///
/// # Errors
///
/// Returns an error after the loop if any year failed, naming the failed
/// years.
pub async fn save_by_year(dir: &Path, posts: &[Post]) -> Result<SaveSummary> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut by_year: BTreeMap<i32, Vec<Post>> = BTreeMap::new();
    let mut skipped = 0usize;
    for post in posts {
        match partition_year(&post.timestamp) {
            Ok(year) => by_year.entry(year).or_default().push(post.clone()),
            Err(e) => {
                warn!(id = %post.id, "Skipping post with unparseable timestamp: {e:#}");
                skipped += 1;
            }
        }
    }

    let mut failed_years = Vec::new();
    let mut years_written = 0usize;
    for (year, group) in &by_year {
        info!(year, count = group.len(), "Merging partition");
        match merge_and_save(dir, *year, group).await {
            Ok(total) => {
                debug!(year, total, "Partition saved");
                years_written += 1;
            }
            Err(e) => {
                error!(year, "Failed to save partition: {e:#}");
                failed_years.push(*year);
            }
        }
    }

    if !failed_years.is_empty() {
        anyhow::bail!("failed to save partitions for years {failed_years:?}");
    }

    Ok(SaveSummary {
        years_written,
        skipped,
    })
}
