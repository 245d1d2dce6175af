//! API service modules for Reddit endpoints.
//!
//! Each service groups the commands for one area of the API. The command
//! definitions are public constants so callers can bind and execute them
//! directly through [`RedditClient::execute`](crate::RedditClient::execute).

mod account;
mod comments;
mod subreddits;
mod users;

use crate::auth::Capability;

pub use account::{AccountService, INBOX, ME};
pub use comments::{CommentsService, MoreChildrenParams, MAX_MORE_CHILDREN, MORE_CHILDREN, THREAD};
pub use subreddits::{SubredditsService, TimeFilter, TopParams, ABOUT, HOT, NEW, TOP};
pub use users::{UsersService, USER_ABOUT, USER_COMMENTS};

/// Identifier and accepted capabilities of every built-in command.
pub fn registry() -> Vec<(&'static str, &'static [Capability])> {
    vec![
        (HOT.id(), HOT.capabilities()),
        (NEW.id(), NEW.capabilities()),
        (TOP.id(), TOP.capabilities()),
        (ABOUT.id(), ABOUT.capabilities()),
        (ME.id(), ME.capabilities()),
        (INBOX.id(), INBOX.capabilities()),
        (USER_ABOUT.id(), USER_ABOUT.capabilities()),
        (USER_COMMENTS.id(), USER_COMMENTS.capabilities()),
        (THREAD.id(), THREAD.capabilities()),
        (MORE_CHILDREN.id(), MORE_CHILDREN.capabilities()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_ids_unique() {
        let registry = registry();
        let ids: HashSet<&str> = registry.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn test_registry_capabilities_non_empty() {
        for (id, capabilities) in registry() {
            assert!(!capabilities.is_empty(), "{id} declares no capabilities");
        }
    }

    #[test]
    fn test_account_commands_need_user_scope() {
        for (id, capabilities) in registry() {
            if id.starts_with("account.") {
                assert_eq!(capabilities, &[Capability::UserScoped]);
            } else {
                assert!(capabilities.contains(&Capability::ReadOnly), "{id} rejects read-only");
            }
        }
    }
}
