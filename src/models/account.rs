//! Account and trophy models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::primitives::epoch_seconds;

/// A user account (`t2`).
///
/// `/api/v1/me` returns this without an envelope; `/user/{name}/about`
/// wraps it. Both decode the same way.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    /// Base-36 id
    pub id: String,
    /// Username
    pub name: String,
    /// Karma from submissions
    #[serde(default)]
    pub link_karma: i64,
    /// Karma from comments
    #[serde(default)]
    pub comment_karma: i64,
    /// Verified email address on file
    #[serde(default)]
    pub has_verified_email: Option<bool>,
    /// Moderates at least one subreddit
    #[serde(default)]
    pub is_mod: bool,
    /// Avatar URL
    #[serde(default)]
    pub icon_img: Option<String>,
    /// Creation time
    #[serde(default, deserialize_with = "epoch_seconds::deserialize")]
    pub created_utc: Option<DateTime<Utc>>,
}

/// A trophy or award (`t6`).
#[derive(Debug, Clone, Deserialize)]
pub struct Award {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Trophy id, when it has one
    #[serde(default)]
    pub id: Option<String>,
    /// Award type id
    #[serde(default)]
    pub award_id: Option<String>,
    /// Extra text, e.g. the year earned
    #[serde(default)]
    pub description: Option<String>,
    /// 70px icon URL
    #[serde(default)]
    pub icon_70: Option<String>,
    /// Link associated with the trophy
    #[serde(default)]
    pub url: Option<String>,
}
