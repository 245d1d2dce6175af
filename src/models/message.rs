//! Private message models.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::primitives::{epoch_seconds, Fullname};

/// A private message (`t4`).
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Base-36 id
    pub id: String,
    /// Fullname, e.g. `t4_1ab2cd`
    pub name: Fullname,
    /// Sender; `None` for system messages
    #[serde(default)]
    pub author: Option<String>,
    /// Recipient
    #[serde(default)]
    pub dest: Option<String>,
    /// Subject line
    #[serde(default)]
    pub subject: String,
    /// Markdown body
    #[serde(default)]
    pub body: String,
    /// Unread
    #[serde(default)]
    pub new: bool,
    /// Message in a thread this one answers
    #[serde(default)]
    pub parent_id: Option<Fullname>,
    /// First message of the conversation
    #[serde(default)]
    pub first_message_name: Option<Fullname>,
    /// Creation time
    #[serde(default, deserialize_with = "epoch_seconds::deserialize")]
    pub created_utc: Option<DateTime<Utc>>,
}
