//! Page data built from the stored partitions.
//!
//! Loads every partition file, groups posts for the report pages, and writes
//! a markdown index of the newest posts.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::model::Post;
use crate::store;

/// How many posts the top page lists.
const TOP_POST_COUNT: usize = 20;

/// Posts regrouped for report pages.
#[derive(Debug, Default)]
pub struct PageData {
    /// Newest posts, newest first.
    pub top: Vec<Post>,
    /// Posts keyed by Tokyo-local `YYYY-MM`.
    pub monthly: BTreeMap<String, Vec<Post>>,
    /// Posts keyed by Tokyo-local month (`01`-`12`) across all years.
    pub month_every_year: BTreeMap<String, Vec<Post>>,
}

/// Load and concatenate every partition file under `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed or a partition fails
/// to load.
pub async fn load_posts(dir: &Path) -> Result<Vec<Post>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read data directory: {}", dir.display()))?;

    let mut posts = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            posts.extend(store::load_partition(&path).await?);
        }
    }
    Ok(posts)
}

/// Group posts into page data.
///
/// Posts whose timestamp cannot be parsed appear in `top` ordering (the raw
/// string still sorts) but are left out of the calendar groupings.
#[must_use]
pub fn build_page_data(mut posts: Vec<Post>) -> PageData {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let top = posts.iter().take(TOP_POST_COUNT).cloned().collect();

    let mut monthly: BTreeMap<String, Vec<Post>> = BTreeMap::new();
    let mut month_every_year: BTreeMap<String, Vec<Post>> = BTreeMap::new();
    for post in posts {
        let Ok(local) = store::tokyo_datetime(&post.timestamp) else {
            continue;
        };
        monthly
            .entry(local.format("%Y-%m").to_string())
            .or_default()
            .push(post.clone());
        month_every_year
            .entry(local.format("%m").to_string())
            .or_default()
            .push(post);
    }

    PageData {
        top,
        monthly,
        month_every_year,
    }
}

/// Write the markdown index page listing the newest posts.
///
/// # Errors
///
/// Returns an error if the pages directory cannot be created or written.
pub async fn write_index(dir: &Path, page_data: &PageData) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create pages directory: {}", dir.display()))?;

    let mut out = String::from("# Recent posts\n\n");
    for post in &page_data.top {
        let first_line = post.text.lines().next().unwrap_or("");
        out.push_str(&format!(
            "- `{}` {} ([link]({}))\n",
            post.timestamp, first_line, post.permalink
        ));
    }

    let path = dir.join("index.md");
    tokio::fs::write(&path, out)
        .await
        .with_context(|| format!("Failed to write index page: {}", path.display()))
}

/// Load everything stored, build page data, and write the index.
///
/// # Errors
///
/// Returns an error if loading or writing fails.
pub async fn run_report(config: &Config) -> Result<()> {
    let posts = load_posts(&config.output_dir).await?;
    info!(count = posts.len(), "Loaded stored posts");

    let page_data = build_page_data(posts);
    write_index(&config.pages_dir, &page_data).await?;
    info!(
        top = page_data.top.len(),
        months = page_data.monthly.len(),
        "Report pages written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, timestamp: &str) -> Post {
        Post {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            text: format!("post {id}"),
            ..Post::default()
        }
    }

    #[test]
    fn test_build_page_data_groups_by_month() {
        let posts = vec![
            post("1", "2025-01-15T10:00:00+0900"),
            post("2", "2025-02-01T10:00:00+0900"),
            post("3", "2024-01-10T10:00:00+0900"),
        ];

        let data = build_page_data(posts);

        assert_eq!(data.top.len(), 3);
        assert_eq!(data.top[0].id, "2");

        let monthly: Vec<&String> = data.monthly.keys().collect();
        assert_eq!(monthly, vec!["2024-01", "2025-01", "2025-02"]);

        // January posts from both years fold into one bucket.
        assert_eq!(data.month_every_year["01"].len(), 2);
        assert_eq!(data.month_every_year["02"].len(), 1);
    }

    #[test]
    fn test_build_page_data_skips_unparseable_in_groupings() {
        let posts = vec![post("1", ""), post("2", "2025-01-15T10:00:00+0900")];

        let data = build_page_data(posts);

        assert_eq!(data.top.len(), 2);
        assert_eq!(data.monthly.len(), 1);
        assert_eq!(data.monthly["2025-01"].len(), 1);
    }

    #[test]
    fn test_build_page_data_caps_top_list() {
        let posts = (0..30)
            .map(|i| post(&i.to_string(), &format!("2025-01-{:02}T10:00:00+0900", i % 28 + 1)))
            .collect();
        let data = build_page_data(posts);
        assert_eq!(data.top.len(), 20);
    }

    #[tokio::test]
    async fn test_load_posts_reads_only_jsonl() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let line = serde_json::to_string(&post("1", "2025-01-15T10:00:00+0900")).unwrap();
        tokio::fs::write(dir.path().join("posts_2025.jsonl"), format!("{line}\n"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "not a partition")
            .await
            .unwrap();

        let posts = load_posts(dir.path()).await.expect("load failed");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "1");
    }

    #[tokio::test]
    async fn test_write_index_lists_top_posts() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let data = build_page_data(vec![post("1", "2025-01-15T10:00:00+0900")]);

        write_index(dir.path(), &data).await.expect("write failed");

        let index = tokio::fs::read_to_string(dir.path().join("index.md"))
            .await
            .expect("index should exist");
        assert!(index.contains("post 1"));
        assert!(index.starts_with("# Recent posts"));
    }
}
