//! Data models for the Reddit API.
//!
//! Models are organized by domain:
//!
//! - [`thing`] - `{kind, data}` envelopes, [`Kind`], and polymorphic decoding
//! - [`listing`] - cursor-paginated pages
//! - [`primitives`] - identifier newtypes such as [`Fullname`]
//! - [`comment`], [`submission`], [`subreddit`], [`account`], [`message`] -
//!   concrete entities

pub mod account;
pub mod comment;
pub mod listing;
pub mod message;
pub mod primitives;
pub mod submission;
pub mod subreddit;
pub mod thing;

pub use account::*;
pub use comment::*;
pub use listing::*;
pub use message::*;
pub use primitives::*;
pub use submission::*;
pub use subreddit::*;
pub use thing::*;
