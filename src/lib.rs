//! Threads post archiver library.
//!
//! Fetches a user's Threads posts (replies, quotes, reposts, and reply
//! chains included) from the Threads Graph API, resolves cross-referenced
//! posts one level deep, and persists everything as yearly newline-delimited
//! JSON partitions deduplicated by post ID.

pub mod api;
pub mod collect;
pub mod config;
pub mod model;
pub mod report;
pub mod store;
pub mod threads;
