//! Operations on the signed-in account.

use std::sync::Arc;

use crate::auth::Capability;
use crate::client::paginated::{ListingStream, ListingStreamBuilder, PaginationOptions};
use crate::client::ClientInner;
use crate::command::{CommandDefinition, RequestDescriptor};
use crate::models::{Account, InboxItem};
use crate::Result;

const USER_ONLY: &[Capability] = &[Capability::UserScoped];

fn me_request(_: &()) -> RequestDescriptor {
    RequestDescriptor::get("/api/v1/me")
}

fn inbox_request(_: &()) -> RequestDescriptor {
    RequestDescriptor::get("/message/inbox")
}

/// `GET /api/v1/me`
pub const ME: CommandDefinition<()> = CommandDefinition::new("account.me", USER_ONLY, me_request);

/// `GET /message/inbox`
pub const INBOX: CommandDefinition<()> = CommandDefinition::new("account.inbox", USER_ONLY, inbox_request);

/// Service for the account the client is signed in as.
///
/// Every operation needs a user-scoped grant; read-only credentials fail
/// with [`Error::AuthorizationMismatch`](crate::Error::AuthorizationMismatch)
/// without contacting the server.
pub struct AccountService {
    inner: Arc<ClientInner>,
}

impl AccountService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Get the signed-in account.
    pub async fn me(&self) -> Result<Account> {
        self.inner.fetch(&ME.bind(&())).await
    }

    /// Stream the inbox: private messages and comment replies, mixed.
    pub fn inbox(&self, options: PaginationOptions) -> ListingStream<InboxItem> {
        ListingStreamBuilder::new(self.inner.clone(), INBOX.bind(&()))
            .options(options)
            .build()
    }
}
