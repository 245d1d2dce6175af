//! Comment tree models.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::listing::ListingPage;
use super::primitives::{epoch_seconds, Fullname};
use super::thing::{CommentTreeNode, FromThing};

/// A comment (`t1`).
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// Base-36 id
    pub id: String,
    /// Fullname, e.g. `t1_c0abc`
    pub name: Fullname,
    /// Author's username; `None` once deleted
    #[serde(default)]
    pub author: Option<String>,
    /// Markdown body
    #[serde(default)]
    pub body: String,
    /// Subreddit name without the `r/` prefix
    #[serde(default)]
    pub subreddit: Option<String>,
    /// Submission this comment belongs to
    #[serde(default)]
    pub link_id: Option<Fullname>,
    /// Parent comment or submission
    #[serde(default)]
    pub parent_id: Option<Fullname>,
    /// Net score
    #[serde(default)]
    pub score: i64,
    /// Nesting depth within the thread
    #[serde(default)]
    pub depth: Option<u32>,
    /// Creation time
    #[serde(default, deserialize_with = "epoch_seconds::deserialize")]
    pub created_utc: Option<DateTime<Utc>>,
    /// Child nodes; `None` when the comment has no loaded replies
    #[serde(default, deserialize_with = "deserialize_replies")]
    pub replies: Option<ListingPage<CommentTreeNode>>,
}

impl Comment {
    /// Loaded direct replies.
    pub fn children(&self) -> &[CommentTreeNode] {
        self.replies
            .as_ref()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }
}

/// Placeholder for replies that were not expanded (`more`).
#[derive(Debug, Clone, Deserialize)]
pub struct More {
    /// Base-36 id
    pub id: String,
    /// Fullname
    #[serde(default)]
    pub name: Option<Fullname>,
    /// Parent comment or submission
    #[serde(default)]
    pub parent_id: Option<Fullname>,
    /// Number of hidden comments
    #[serde(default)]
    pub count: u64,
    /// Nesting depth
    #[serde(default)]
    pub depth: Option<u32>,
    /// Ids to pass to `morechildren`
    #[serde(default)]
    pub children: Vec<String>,
}

/// Unloaded replies arrive as `""` rather than an empty listing.
fn deserialize_replies<'de, D>(
    deserializer: D,
) -> Result<Option<ListingPage<CommentTreeNode>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        other => ListingPage::from_thing(other)
            .map(Some)
            .map_err(D::Error::custom),
    }
}
