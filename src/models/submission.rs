//! Submission (link or self post) models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::primitives::{epoch_seconds, Fullname};

/// A submission (`t3`).
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    /// Base-36 id
    pub id: String,
    /// Fullname, e.g. `t3_15bfi0`
    pub name: Fullname,
    /// Title
    #[serde(default)]
    pub title: String,
    /// Author's username; `None` once deleted
    #[serde(default)]
    pub author: Option<String>,
    /// Subreddit name without the `r/` prefix
    #[serde(default)]
    pub subreddit: String,
    /// Markdown body of a self post
    #[serde(default)]
    pub selftext: String,
    /// Link target, or the permalink for self posts
    #[serde(default)]
    pub url: Option<String>,
    /// Path of the comments page
    #[serde(default)]
    pub permalink: String,
    /// Net score
    #[serde(default)]
    pub score: i64,
    /// Number of comments
    #[serde(default)]
    pub num_comments: u64,
    /// Whether this is a self post
    #[serde(default)]
    pub is_self: bool,
    /// Marked not-safe-for-work
    #[serde(default)]
    pub over_18: bool,
    /// Pinned by moderators
    #[serde(default)]
    pub stickied: bool,
    /// Creation time
    #[serde(default, deserialize_with = "epoch_seconds::deserialize")]
    pub created_utc: Option<DateTime<Utc>>,
}
