//! Identifier newtypes and wire-format helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::thing::Kind;

/// A kind-prefixed identifier such as `t3_15bfi0`.
///
/// # Example
///
/// ```
/// use reddit_rs::models::{Fullname, Kind};
///
/// let name = Fullname::new("t3_15bfi0");
/// assert_eq!(name.kind(), Some(Kind::Submission));
/// assert_eq!(name.id(), "15bfi0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fullname(String);

impl Fullname {
    /// Wrap an existing fullname.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Combine a kind and a base-36 id.
    pub fn from_parts(kind: Kind, id: &str) -> Self {
        Self(format!("{}_{}", kind.as_str(), id))
    }

    /// The fullname as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind encoded in the prefix, if it is a known one.
    pub fn kind(&self) -> Option<Kind> {
        let (prefix, _) = self.0.split_once('_')?;
        Kind::from_wire(prefix)
    }

    /// The id without its kind prefix.
    pub fn id(&self) -> &str {
        self.0.split_once('_').map_or(self.0.as_str(), |(_, id)| id)
    }
}

impl fmt::Display for Fullname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Fullname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Fullname {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Fullname {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Fractional epoch seconds, as used by `created_utc`.
pub(crate) mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.and_then(|s| DateTime::from_timestamp(s.trunc() as i64, 0)))
    }
}
