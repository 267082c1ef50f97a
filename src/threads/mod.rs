//! Threads Graph API operations: profile lookup, point fetches, and the
//! cursor walk over the two list endpoints.

pub mod resolver;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::model::{Cursors, ListPage, Post, Profile, RawPost, POST_FIELDS, PROFILE_FIELDS};

/// Which list endpoint to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSource {
    /// The user's primary posts.
    Threads,
    /// The user's replies.
    Replies,
}

impl ListSource {
    fn path(self) -> &'static str {
        match self {
            Self::Threads => "/me/threads",
            Self::Replies => "/me/replies",
        }
    }
}

/// High-level Threads operations built on [`ApiClient`].
///
/// The resolver semaphore is created once and shared by every clone, so
/// point-fetch burst concurrency stays bounded process-wide no matter how
/// many list walks run at the same time.
#[derive(Clone)]
pub struct ThreadsClient {
    api: ApiClient,
    page_size: u32,
    resolver_limit: Arc<Semaphore>,
}

impl ThreadsClient {
    #[must_use]
    pub fn new(api: ApiClient, config: &Config) -> Self {
        Self {
            api,
            page_size: config.page_size,
            resolver_limit: Arc::new(Semaphore::new(config.resolver_concurrency)),
        }
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn get_me(&self) -> Result<Profile, ApiError> {
        self.api
            .get("/me", &[("fields", PROFILE_FIELDS.to_string())])
            .await
    }

    /// Fetch a single post by ID.
    ///
    /// The result's own back-references are left unresolved; resolution stops
    /// at depth one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be decoded.
    pub async fn get_post(&self, id: &str) -> Result<Post, ApiError> {
        let raw: RawPost = self
            .api
            .get(&format!("/{id}"), &[("fields", POST_FIELDS.to_string())])
            .await?;
        Ok(raw.into())
    }

    /// Fetch one page of a list endpoint and resolve its back-references.
    async fn fetch_page(
        &self,
        source: ListSource,
        since: Option<&str>,
        until: Option<&str>,
        after: &str,
    ) -> Result<(Vec<Post>, Cursors), ApiError> {
        let mut query = vec![
            ("limit", self.page_size.to_string()),
            ("fields", POST_FIELDS.to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }
        if let Some(until) = until {
            query.push(("until", until.to_string()));
        }
        if !after.is_empty() {
            query.push(("after", after.to_string()));
        }

        let page: ListPage = self.api.get(source.path(), &query).await?;
        let posts = resolver::resolve_batch(self, page.data).await?;
        Ok((posts, page.paging.cursors))
    }

    /// Walk one list endpoint until its `after` cursor comes back empty,
    /// accumulating every page's resolved posts in page order.
    ///
    /// Iteration is unbounded by design; it ends only when the data does.
    ///
    /// # Errors
    ///
    /// Returns the first page-fetch or resolution error.
    pub async fn fetch_all(
        &self,
        source: ListSource,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<Post>, ApiError> {
        let mut posts = Vec::new();
        let mut after = String::new();

        loop {
            let (mut page_posts, cursors) = self.fetch_page(source, since, until, &after).await?;
            posts.append(&mut page_posts);
            if cursors.after.is_empty() {
                break;
            }
            after = cursors.after;
        }

        debug!(source = ?source, count = posts.len(), "List endpoint exhausted");
        Ok(posts)
    }

    /// Walk both list endpoints concurrently and concatenate their results,
    /// primary posts first.
    ///
    /// # Errors
    ///
    /// A failure in either walk fails the whole call; the sibling walk is
    /// dropped at the join point.
    pub async fn fetch_all_sources(
        &self,
        since: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<Post>, ApiError> {
        let (mut threads, mut replies) = tokio::try_join!(
            self.fetch_all(ListSource::Threads, since, until),
            self.fetch_all(ListSource::Replies, since, until),
        )?;
        threads.append(&mut replies);
        Ok(threads)
    }
}
