//! Batch conversion of raw API records with one level of back-reference
//! resolution.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::try_join_all;

use crate::api::ApiError;
use crate::model::{Post, RawPost};
use crate::threads::ThreadsClient;

/// Convert a batch of raw records to [`Post`]s and fill in their
/// back-references.
///
/// Every distinct non-empty reference ID across the batch is fetched exactly
/// once, concurrently, bounded by the client's resolver semaphore. Each
/// resolved post is then attached to every batch entry whose reference ID
/// matches, so two posts quoting the same target share equal resolved values.
///
/// # Errors
///
/// Fails fast: the first point-fetch error aborts the whole batch, dropping
/// the remaining fetches. No partial result is returned.
pub async fn resolve_batch(
    client: &ThreadsClient,
    raw: Vec<RawPost>,
) -> Result<Vec<Post>, ApiError> {
    let mut posts: Vec<Post> = raw.into_iter().map(Post::from).collect();

    let target_ids: BTreeSet<String> = posts
        .iter()
        .flat_map(Post::reference_ids)
        .map(ToString::to_string)
        .collect();

    if target_ids.is_empty() {
        return Ok(posts);
    }

    let resolved = try_join_all(target_ids.iter().map(|id| async move {
        let _permit = client
            .resolver_limit
            .acquire()
            .await
            .expect("resolver semaphore closed");
        client.get_post(id).await
    }))
    .await?;

    // Keyed by the ID the API echoed back; a record without one matches nothing.
    let by_id: HashMap<&str, &Post> = resolved
        .iter()
        .filter(|p| !p.id.is_empty())
        .map(|p| (p.id.as_str(), p))
        .collect();

    for post in &mut posts {
        if let Some(found) = by_id.get(post.quoted_post_id.as_str()) {
            post.quoted_post = Some(Box::new((*found).clone()));
        }
        if let Some(found) = by_id.get(post.reposted_post_id.as_str()) {
            post.reposted_post = Some(Box::new((*found).clone()));
        }
        if let Some(found) = by_id.get(post.root_post_id.as_str()) {
            post.root_post = Some(Box::new((*found).clone()));
        }
        if let Some(found) = by_id.get(post.replied_to_id.as_str()) {
            post.replied_to = Some(Box::new((*found).clone()));
        }
    }

    Ok(posts)
}
