//! # reddit-rs
//!
//! An async execution engine for the Reddit API.
//!
//! The crate turns declarative commands into authenticated, rate-limited
//! HTTP calls and decodes the responses into typed models.
//!
//! ## Features
//!
//! - **Authentication**: read-only, installed-client, password, and
//!   interactive (authorization-code) grants with shared, lazily refreshed
//!   tokens
//! - **Capability checks**: commands declare what kind of grant they need
//!   and fail before any network call when the credentials cannot satisfy them
//! - **Rate limiting**: a token bucket with a bounded FIFO wait queue
//! - **Listings**: lazy `Stream`s that follow `after` cursors
//! - **Polymorphic decoding**: `{kind, data}` envelopes decoded into concrete
//!   types or capability enums such as [`models::CommentTreeNode`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use reddit_rs::{Credentials, PaginationOptions, RedditClient};
//!
//! #[tokio::main]
//! async fn main() -> reddit_rs::Result<()> {
//!     let credentials = Credentials::read_only("client-id", "client-secret")?;
//!     let client = RedditClient::new(credentials)?;
//!
//!     let options = PaginationOptions::default().with_maximum_items(40);
//!     let mut hot = client.subreddits().hot("rust", options);
//!
//!     while let Some(post) = hot.next().await {
//!         let post = post?;
//!         println!("[{}] {}", post.score, post.title);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Commands
//!
//! ```rust,no_run
//! use reddit_rs::auth::USER_CONTEXT;
//! use reddit_rs::command::{CommandDefinition, RequestDescriptor};
//! use reddit_rs::models::Subreddit;
//! use reddit_rs::RedditClient;
//!
//! fn random(_: &()) -> RequestDescriptor {
//!     RequestDescriptor::get("/r/random/about")
//! }
//!
//! const RANDOM: CommandDefinition<()> = CommandDefinition::new("subreddit.random", USER_CONTEXT, random);
//!
//! # async fn example(client: RedditClient) -> reddit_rs::Result<()> {
//! let subreddit: Subreddit = client.fetch(&RANDOM.bind(&())).await?;
//! println!("Try r/{}", subreddit.display_name);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod client;
pub mod command;
pub mod error;
pub mod models;
pub mod rate_limit;

// Re-export primary types at crate root for convenience
pub use auth::{AuthenticationContext, Capability, Credentials};
pub use client::{ClientConfig, ListingStream, PaginationOptions, RedditClient};
pub use command::{Command, CommandDefinition, RequestDescriptor};
pub use error::{Error, Result};
pub use models::{Fullname, Kind};
pub use rate_limit::{RateLimitConfig, RateLimiter};

/// Prelude module for convenient imports.
///
/// ```rust
/// use reddit_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::TimeFilter;
    pub use crate::auth::{AuthenticationContext, Capability, Credentials, GrantDuration};
    pub use crate::client::{ClientConfig, ListingStream, PaginationOptions, RedditClient};
    pub use crate::command::{Command, CommandDefinition, RequestDescriptor};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        Account, Comment, CommentTreeNode, Entity, FromThing, Fullname, InboxItem, Kind,
        ListingPage, Message, More, Submission, Subreddit,
    };
    pub use crate::rate_limit::RateLimitConfig;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullname_creation() {
        let name = Fullname::new("t3_15bfi0");
        assert_eq!(name.as_str(), "t3_15bfi0");
        assert_eq!(name.kind(), Some(Kind::Submission));
    }

    #[test]
    fn test_default_endpoints() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "https://oauth.reddit.com");
        assert_eq!(config.auth_base_url, "https://www.reddit.com");
    }
}
