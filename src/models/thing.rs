//! Decoding of `{kind, data}` envelopes.
//!
//! Responses wrap every entity as `{"kind": "t3", "data": {...}}`. There are
//! two ways to decode one:
//!
//! - **Concrete**: the caller names the type (`Submission::from_thing`). The
//!   `data` member is decoded directly; `kind` is not inspected.
//! - **Polymorphic**: the caller asks for [`Entity`] or a capability enum
//!   such as [`CommentTreeNode`]. `kind` selects the concrete type, and the
//!   result must belong to the requested capability.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::account::{Account, Award};
use super::comment::{Comment, More};
use super::listing::ListingPage;
use super::message::Message;
use super::submission::Submission;
use super::subreddit::Subreddit;
use crate::{Error, Result};

/// Wire discriminator of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `t1`
    Comment,
    /// `t2`
    Account,
    /// `t3`
    Submission,
    /// `t4`
    Message,
    /// `t5`
    Subreddit,
    /// `t6`
    Award,
    /// `more`, a placeholder for collapsed comments
    More,
    /// `Listing`
    Listing,
}

impl Kind {
    /// Every known kind.
    pub const ALL: [Kind; 8] = [
        Kind::Comment,
        Kind::Account,
        Kind::Submission,
        Kind::Message,
        Kind::Subreddit,
        Kind::Award,
        Kind::More,
        Kind::Listing,
    ];

    /// The discriminator as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Comment => "t1",
            Kind::Account => "t2",
            Kind::Submission => "t3",
            Kind::Message => "t4",
            Kind::Subreddit => "t5",
            Kind::Award => "t6",
            Kind::More => "more",
            Kind::Listing => "Listing",
        }
    }

    /// Look up a wire discriminator.
    pub fn from_wire(s: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Kind::from_wire(s).ok_or_else(|| Error::decode(format!("unknown kind `{s}`")))
    }
}

/// Types that can be decoded from a `{kind, data}` envelope.
pub trait FromThing: Sized {
    /// Decode from a JSON value.
    fn from_thing(value: Value) -> Result<Self>;
}

/// Read the `kind` member of an envelope.
pub fn read_kind(value: &Value) -> Result<Kind> {
    let raw = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::decode("missing `kind` discriminator"))?;
    raw.parse()
}

/// Decode the `data` member of an envelope, or the value itself when it is
/// not wrapped.
pub(crate) fn decode_data<T: DeserializeOwned>(value: Value) -> Result<T> {
    let data = match value {
        Value::Object(mut map) if map.contains_key("kind") && map.contains_key("data") => map
            .remove("data")
            .unwrap_or(Value::Null),
        other => other,
    };
    serde_json::from_value(data).map_err(|e| {
        Error::decode(format!(
            "cannot decode {}: {e}",
            std::any::type_name::<T>()
        ))
    })
}

macro_rules! concrete_things {
    ($($ty:ty => $kind:expr),+ $(,)?) => {
        $(
            impl FromThing for $ty {
                fn from_thing(value: Value) -> Result<Self> {
                    decode_data(value)
                }
            }

            impl $ty {
                /// Wire discriminator of this type.
                pub const KIND: Kind = $kind;
            }
        )+
    };
}

concrete_things! {
    Comment => Kind::Comment,
    Account => Kind::Account,
    Submission => Kind::Submission,
    Message => Kind::Message,
    Subreddit => Kind::Subreddit,
    Award => Kind::Award,
    More => Kind::More,
}

/// Any entity, selected by its `kind`.
#[derive(Debug, Clone)]
pub enum Entity {
    /// `t1`
    Comment(Comment),
    /// `t2`
    Account(Account),
    /// `t3`
    Submission(Submission),
    /// `t4`
    Message(Message),
    /// `t5`
    Subreddit(Subreddit),
    /// `t6`
    Award(Award),
    /// `more`
    More(More),
    /// `Listing`
    Listing(ListingPage<Entity>),
}

impl Entity {
    /// Kind of the wrapped value.
    pub fn kind(&self) -> Kind {
        match self {
            Entity::Comment(_) => Kind::Comment,
            Entity::Account(_) => Kind::Account,
            Entity::Submission(_) => Kind::Submission,
            Entity::Message(_) => Kind::Message,
            Entity::Subreddit(_) => Kind::Subreddit,
            Entity::Award(_) => Kind::Award,
            Entity::More(_) => Kind::More,
            Entity::Listing(_) => Kind::Listing,
        }
    }
}

impl FromThing for Entity {
    fn from_thing(value: Value) -> Result<Self> {
        Ok(match read_kind(&value)? {
            Kind::Comment => Entity::Comment(Comment::from_thing(value)?),
            Kind::Account => Entity::Account(Account::from_thing(value)?),
            Kind::Submission => Entity::Submission(Submission::from_thing(value)?),
            Kind::Message => Entity::Message(Message::from_thing(value)?),
            Kind::Subreddit => Entity::Subreddit(Subreddit::from_thing(value)?),
            Kind::Award => Entity::Award(Award::from_thing(value)?),
            Kind::More => Entity::More(More::from_thing(value)?),
            Kind::Listing => Entity::Listing(ListingPage::from_thing(value)?),
        })
    }
}

/// Declares an enum over a subset of entity kinds, decodable polymorphically.
macro_rules! capability {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant($variant),
            )+
        }

        impl $name {
            /// Kinds this capability admits.
            pub const KINDS: &'static [Kind] = &[$(Kind::$variant),+];

            /// Kind of the wrapped value.
            pub fn kind(&self) -> Kind {
                match self {
                    $($name::$variant(_) => Kind::$variant,)+
                }
            }
        }

        impl TryFrom<Entity> for $name {
            type Error = Error;

            fn try_from(entity: Entity) -> Result<Self> {
                match entity {
                    $(Entity::$variant(v) => Ok($name::$variant(v)),)+
                    other => Err(Error::decode(format!(
                        "kind `{}` is not a {}",
                        other.kind(),
                        stringify!($name)
                    ))),
                }
            }
        }

        impl FromThing for $name {
            fn from_thing(value: Value) -> Result<Self> {
                let kind = read_kind(&value)?;
                if !Self::KINDS.contains(&kind) {
                    return Err(Error::decode(format!(
                        "kind `{kind}` is not a {}",
                        stringify!($name)
                    )));
                }
                Entity::from_thing(value)?.try_into()
            }
        }
    };
}

capability! {
    /// A node in a comment tree: a comment or a collapsed-replies marker.
    CommentTreeNode { Comment, More }
}

capability! {
    /// An inbox entry: a private message or a comment reply.
    InboxItem { Comment, Message }
}

impl CommentTreeNode {
    /// The comment, if this node is one.
    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            CommentTreeNode::Comment(c) => Some(c),
            CommentTreeNode::More(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comment_thing(id: &str) -> Value {
        json!({
            "kind": "t1",
            "data": { "id": id, "name": format!("t1_{id}"), "author": "alice", "body": "hi", "replies": "" }
        })
    }

    #[test]
    fn test_kind_wire_names() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_wire(kind.as_str()), Some(kind));
        }
        assert!("t9".parse::<Kind>().unwrap_err().is_decode_error());
    }

    #[test]
    fn test_concrete_decode_ignores_kind() {
        // Concrete decoding trusts the caller and never looks at `kind`.
        let mut value = comment_thing("c1");
        value["kind"] = json!("t3");

        let comment = Comment::from_thing(value).unwrap();
        assert_eq!(comment.id, "c1");
    }

    #[test]
    fn test_concrete_decode_accepts_bare_data() {
        let account = Account::from_thing(json!({ "id": "abc", "name": "spez" })).unwrap();
        assert_eq!(account.name, "spez");
    }

    #[test]
    fn test_entity_dispatch() {
        let entity = Entity::from_thing(json!({
            "kind": "t5",
            "data": { "id": "2qh1i", "name": "t5_2qh1i", "display_name": "rust" }
        }))
        .unwrap();

        match entity {
            Entity::Subreddit(sr) => assert_eq!(sr.display_name, "rust"),
            other => panic!("Expected subreddit, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_entity_unknown_kind() {
        let err = Entity::from_thing(json!({ "kind": "t9", "data": {} })).unwrap_err();
        assert!(matches!(err, Error::Decode(ref m) if m.contains("t9")));

        let err = Entity::from_thing(json!({ "data": {} })).unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_capability_accepts_members() {
        let node = CommentTreeNode::from_thing(json!({
            "kind": "more",
            "data": { "id": "m1", "name": "t1_m1", "count": 12, "children": ["a", "b"] }
        }))
        .unwrap();
        assert_eq!(node.kind(), Kind::More);

        let node = CommentTreeNode::from_thing(comment_thing("c2")).unwrap();
        assert_eq!(node.as_comment().map(|c| c.id.as_str()), Some("c2"));
    }

    #[test]
    fn test_capability_rejects_other_kinds() {
        let err = InboxItem::from_thing(json!({
            "kind": "t3",
            "data": { "id": "p1", "name": "t3_p1", "title": "hello" }
        }))
        .unwrap_err();

        assert!(matches!(err, Error::Decode(ref m) if m.contains("InboxItem")));
    }

    #[test]
    fn test_try_from_entity() {
        let entity = Entity::from_thing(comment_thing("c3")).unwrap();
        let item = InboxItem::try_from(entity).unwrap();
        assert_eq!(item.kind(), Kind::Comment);
    }
}
