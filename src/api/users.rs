//! Public user profiles.

use std::sync::Arc;

use crate::auth::USER_CONTEXT;
use crate::client::paginated::{ListingStream, ListingStreamBuilder, PaginationOptions};
use crate::client::ClientInner;
use crate::command::{CommandDefinition, RequestDescriptor};
use crate::models::{Account, Comment};
use crate::Result;

fn about_request(username: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/user/{username}/about"))
}

fn comments_request(username: &str) -> RequestDescriptor {
    RequestDescriptor::get(format!("/user/{username}/comments"))
}

/// `GET /user/{username}/about`
pub const USER_ABOUT: CommandDefinition<str> =
    CommandDefinition::new("user.about", USER_CONTEXT, about_request);

/// `GET /user/{username}/comments`
pub const USER_COMMENTS: CommandDefinition<str> =
    CommandDefinition::new("user.comments", USER_CONTEXT, comments_request);

/// Service for looking up other users.
pub struct UsersService {
    inner: Arc<ClientInner>,
}

impl UsersService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get a user's public profile.
    pub async fn about(&self, username: &str) -> Result<Account> {
        self.inner.fetch(&USER_ABOUT.bind(username)).await
    }

    /// Stream a user's comments, newest first.
    pub fn comments(&self, username: &str, options: PaginationOptions) -> ListingStream<Comment> {
        ListingStreamBuilder::new(self.inner.clone(), USER_COMMENTS.bind(username))
            .options(options)
            .build()
    }
}
