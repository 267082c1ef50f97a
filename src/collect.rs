//! One collection run: fetch every post in range and merge the batch into
//! the yearly partitions.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::store;
use crate::threads::ThreadsClient;

/// Counters from a collection run, for the caller to log.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectStats {
    pub fetched: usize,
    pub years_written: usize,
    pub skipped_timestamps: usize,
    pub empty_ids: usize,
}

/// Fetch all posts between `since` and `until` (both optional ISO dates) and
/// merge them into the partition files under the configured output directory.
///
/// # Errors
///
/// Returns an error if the profile or post fetch fails, or if any yearly
/// partition could not be saved (other years are still written first).
pub async fn collect(
    client: &ThreadsClient,
    config: &Config,
    since: Option<&str>,
    until: Option<&str>,
) -> Result<CollectStats> {
    let profile = client
        .get_me()
        .await
        .context("Failed to fetch the authenticated profile")?;
    info!(user = %profile.username, id = %profile.id, "Collecting posts");

    let posts = client
        .fetch_all_sources(since, until)
        .await
        .context("Failed to fetch posts")?;
    info!(count = posts.len(), "Fetched posts");

    // An empty ID still gets stored, but first-wins dedup collapses all such
    // records into one; make that visible instead of silent.
    let empty_ids = posts.iter().filter(|p| p.id.is_empty()).count();
    if empty_ids > 0 {
        warn!(
            count = empty_ids,
            "Posts without an ID fetched; deduplication will collapse them"
        );
    }

    let summary = store::save_by_year(&config.output_dir, &posts).await?;

    Ok(CollectStats {
        fetched: posts.len(),
        years_written: summary.years_written,
        skipped_timestamps: summary.skipped,
        empty_ids,
    })
}
