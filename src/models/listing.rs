//! Cursor-paginated listings.

use serde::Deserialize;
use serde_json::Value;

use super::thing::{decode_data, FromThing};
use crate::Result;

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct ListingPage<T> {
    /// Items on this page, in server order
    pub items: Vec<T>,
    /// Cursor for the page before this one
    pub before: Option<String>,
    /// Cursor for the page after this one; absent or empty on the last page
    pub after: Option<String>,
}

impl<T> ListingPage<T> {
    /// Cursor for the next page, treating an empty string as absent.
    pub fn next_cursor(&self) -> Option<&str> {
        self.after.as_deref().filter(|after| !after.is_empty())
    }

    /// Decode every item with `f`, stopping at the first failure.
    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<ListingPage<U>> {
        Ok(ListingPage {
            items: self.items.into_iter().map(f).collect::<Result<_>>()?,
            before: self.before,
            after: self.after,
        })
    }
}

impl<T> Default for ListingPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            before: None,
            after: None,
        }
    }
}

#[derive(Deserialize)]
struct RawListing {
    #[serde(default)]
    children: Vec<Value>,
    #[serde(default)]
    before: Option<String>,
    #[serde(default)]
    after: Option<String>,
}

impl ListingPage<Value> {
    /// Split a listing envelope into undecoded children and cursors.
    pub fn from_envelope(value: Value) -> Result<Self> {
        let raw: RawListing = decode_data(value)?;
        Ok(Self {
            items: raw.children,
            before: raw.before,
            after: raw.after,
        })
    }
}

impl<T: FromThing> FromThing for ListingPage<T> {
    fn from_thing(value: Value) -> Result<Self> {
        ListingPage::from_envelope(value)?.try_map(T::from_thing)
    }
}
