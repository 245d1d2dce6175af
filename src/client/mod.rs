//! HTTP client, execution pipeline, and listing streams.
//!
//! [`RedditClient`] is the entry point. Every command it runs passes through
//! the same pipeline: capability check, authentication, rate limiting,
//! transport, and error mapping.
//!
//! # Example
//!
//! ```no_run
//! use reddit_rs::{ClientConfig, Credentials, RedditClient};
//!
//! # async fn example() -> reddit_rs::Result<()> {
//! let credentials = Credentials::builder()
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .password("my-bot", "hunter2")
//!     .build()?;
//!
//! let config = ClientConfig::default().with_user_agent("linux:my-bot:v1.0 (by /u/my-bot)");
//! let client = RedditClient::with_config(credentials, config)?;
//!
//! let me = client.account().me().await?;
//! println!("{} has {} comment karma", me.name, me.comment_karma);
//! # Ok(())
//! # }
//! ```

mod config;
mod http;
pub mod paginated;
pub mod transport;

pub use config::{ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL};
pub use http::{ClientBuilder, RedditClient};
pub use paginated::{
    ListingStream, PageFuture, PageRequest, PaginationOptions, DEFAULT_ITEMS_PER_REQUEST,
    MAX_ITEMS_PER_REQUEST,
};
pub use transport::{HttpRequest, HttpResponse, RequestAuth, RequestBody, ReqwestTransport, Transport};
pub(crate) use http::ClientInner;
