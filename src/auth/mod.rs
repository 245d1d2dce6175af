//! Authentication for the Reddit API.
//!
//! Four grants are supported, chosen through [`Credentials`]:
//!
//! 1. **Read-only** (`client_credentials`) - application-only access
//! 2. **Installed client** - application-only access keyed by a device id
//! 3. **Password** - a script app acting as its owner
//! 4. **Interactive** (`authorization_code`) - a user approves access in a
//!    browser; the session is persisted in a [`SessionStore`]
//!
//! The [`Authenticator`] owns the resulting [`AuthenticationContext`] and
//! refreshes it when it expires. Every context carries [`Capability`] tags
//! that commands are checked against before they are sent.
//!
//! # Application-only access
//!
//! ```no_run
//! use reddit_rs::{Credentials, RedditClient};
//!
//! # async fn example() -> reddit_rs::Result<()> {
//! let credentials = Credentials::read_only("client-id", "client-secret")?;
//! let client = RedditClient::new(credentials)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Interactive access
//!
//! ```no_run
//! use reddit_rs::auth::{Credentials, GrantDuration};
//! use reddit_rs::RedditClient;
//!
//! # async fn example(code_from_redirect: String) -> reddit_rs::Result<()> {
//! let credentials = Credentials::builder()
//!     .client_id("client-id")
//!     .client_secret("client-secret")
//!     .interactive("http://localhost:8080/callback", "session-42")
//!     .authorization_code(code_from_redirect)
//!     .build()?;
//!
//! let client = RedditClient::new(credentials)?;
//! let me = client.account().me().await?;
//! println!("Signed in as {}", me.name);
//! # Ok(())
//! # }
//! ```

mod authenticator;
mod clock;
mod context;
mod credentials;
mod store;
mod strategy;
mod token;

pub use authenticator::{AuthenticationState, Authenticator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{
    capabilities_intersect, AuthenticationContext, Capability, APPLICATION_ONLY, USER_CONTEXT,
};
pub use credentials::{
    Credentials, CredentialsBuilder, GrantDuration, InteractiveCredentials, InteractiveMode,
    NonInteractiveCredentials, NonInteractiveMode,
};
pub use store::{InMemorySessionStore, SessionStore};
pub use strategy::AuthenticationStrategy;
pub use token::{Token, INSTALLED_CLIENT_GRANT};

pub(crate) use strategy::strategy_for;
pub(crate) use token::TokenEndpoint;
