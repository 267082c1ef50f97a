//! Wire and storage shapes for the Threads Graph API.
//!
//! The API returns loosely-populated JSON objects; every field here carries an
//! explicit default so that a sparse record never fails to parse. Records are
//! decoded into [`RawPost`] at the wire boundary and converted to [`Post`],
//! the shape that is resolved, deduplicated, and persisted.

use serde::{Deserialize, Serialize};

/// Field list requested on every post read (list endpoints and point lookups).
pub const POST_FIELDS: &str = "id,media_product_type,media_type,media_url,permalink,owner,username,text,timestamp,is_quote_post,has_replies,quoted_post,reposted_post,root_post,replied_to";

/// Field list requested from the `/me` profile endpoint.
pub const PROFILE_FIELDS: &str = "id,username,name,threads_profile_picture_url,threads_biography";

/// One archived post, stored as one line of a yearly partition file.
///
/// The four `*_id` fields hold back-reference IDs (empty when absent); each
/// may be paired with a resolved post fetched independently. Resolution stops
/// at depth one: a resolved post's own nested fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: String,
    pub media_product_type: String,
    pub media_type: String,
    pub media_url: String,
    pub permalink: String,
    pub owner_id: String,
    pub username: String,
    pub text: String,
    pub timestamp: String,
    pub is_quote_post: bool,
    pub has_replies: bool,
    pub quoted_post_id: String,
    pub reposted_post_id: String,
    pub root_post_id: String,
    pub replied_to_id: String,
    pub quoted_post: Option<Box<Post>>,
    pub reposted_post: Option<Box<Post>>,
    pub root_post: Option<Box<Post>>,
    pub replied_to: Option<Box<Post>>,
}

impl Post {
    /// Non-empty back-reference IDs of this post, in slot order.
    pub fn reference_ids(&self) -> impl Iterator<Item = &str> {
        [
            self.quoted_post_id.as_str(),
            self.reposted_post_id.as_str(),
            self.root_post_id.as_str(),
            self.replied_to_id.as_str(),
        ]
        .into_iter()
        .filter(|id| !id.is_empty())
    }
}

/// A post as the API returns it. Back-references arrive as `{"id": …}`
/// objects; a missing object defaults to an empty ID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPost {
    pub id: String,
    pub media_product_type: String,
    pub media_type: String,
    pub media_url: String,
    pub permalink: String,
    pub owner: IdRef,
    pub username: String,
    pub text: String,
    pub timestamp: String,
    pub is_quote_post: bool,
    pub has_replies: bool,
    pub quoted_post: IdRef,
    pub reposted_post: IdRef,
    pub root_post: IdRef,
    pub replied_to: IdRef,
}

/// An object-valued reference carrying only an ID.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdRef {
    pub id: String,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            media_product_type: raw.media_product_type,
            media_type: raw.media_type,
            media_url: raw.media_url,
            permalink: raw.permalink,
            owner_id: raw.owner.id,
            username: raw.username,
            text: raw.text,
            timestamp: raw.timestamp,
            is_quote_post: raw.is_quote_post,
            has_replies: raw.has_replies,
            quoted_post_id: raw.quoted_post.id,
            reposted_post_id: raw.reposted_post.id,
            root_post_id: raw.root_post.id,
            replied_to_id: raw.replied_to.id,
            quoted_post: None,
            reposted_post: None,
            root_post: None,
            replied_to: None,
        }
    }
}

/// One page of a list endpoint: a `data` array plus pagination cursors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListPage {
    pub data: Vec<RawPost>,
    pub paging: Paging,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub cursors: Cursors,
}

/// Opaque pagination tokens. An empty `after` means the walk is exhausted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Cursors {
    pub before: String,
    pub after: String,
}

/// The authenticated user's profile from `/me`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub name: String,
    #[serde(rename = "threads_profile_picture_url")]
    pub profile_picture_url: String,
    #[serde(rename = "threads_biography")]
    pub biography: String,
}
