//! Subreddit models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::primitives::{epoch_seconds, Fullname};

/// A subreddit (`t5`).
#[derive(Debug, Clone, Deserialize)]
pub struct Subreddit {
    /// Base-36 id
    pub id: String,
    /// Fullname, e.g. `t5_2qh1i`
    pub name: Fullname,
    /// Name without the `r/` prefix
    #[serde(default)]
    pub display_name: String,
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Short sidebar description
    #[serde(default)]
    pub public_description: String,
    /// Subscriber count; hidden for some communities
    #[serde(default)]
    pub subscribers: Option<u64>,
    /// Relative URL, e.g. `/r/rust/`
    #[serde(default)]
    pub url: String,
    /// Marked not-safe-for-work
    #[serde(default)]
    pub over18: Option<bool>,
    /// `public`, `private`, `restricted`, ...
    #[serde(default)]
    pub subreddit_type: Option<String>,
    /// Creation time
    #[serde(default, deserialize_with = "epoch_seconds::deserialize")]
    pub created_utc: Option<DateTime<Utc>>,
}
