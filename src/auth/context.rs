//! Capability tags and the authenticated context commands run under.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::token::Token;
use crate::command::Command;

/// Authorization class of an authentication context.
///
/// Commands declare which capabilities they accept; a context may run a
/// command when the two sets intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Application-only access to public data
    ReadOnly,
    /// Access on behalf of a specific user
    UserScoped,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReadOnly => f.write_str("read-only"),
            Capability::UserScoped => f.write_str("user-scoped"),
        }
    }
}

/// Capabilities carried by application-only grants.
pub const APPLICATION_ONLY: &[Capability] = &[Capability::ReadOnly];

/// Capabilities carried by grants made on behalf of a user.
pub const USER_CONTEXT: &[Capability] = &[Capability::ReadOnly, Capability::UserScoped];

/// Returns `true` when `granted` and `required` share at least one tag.
pub fn capabilities_intersect(granted: &[Capability], required: &[Capability]) -> bool {
    required.iter().any(|cap| granted.contains(cap))
}

/// An issued token plus the capability tags of the grant that produced it.
///
/// Contexts are immutable; refreshing produces a new one.
#[derive(Clone)]
pub struct AuthenticationContext {
    label: String,
    token: Token,
    capabilities: &'static [Capability],
    created_at: DateTime<Utc>,
}

impl AuthenticationContext {
    /// Create a context from a freshly issued token.
    pub fn new(
        label: impl Into<String>,
        token: Token,
        capabilities: &'static [Capability],
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            label: label.into(),
            token,
            capabilities,
            created_at,
        }
    }

    /// Human-readable name of the grant, used in errors and logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The issued token.
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Bearer token presented on API requests.
    pub fn access_token(&self) -> &SecretString {
        self.token.access_token()
    }

    /// Capability tags of this context.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.capabilities
    }

    /// When the token was obtained.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Instant after which the token is considered expired.
    ///
    /// A lifetime too large to represent saturates to
    /// [`DateTime::<Utc>::MAX_UTC`], i.e. the token never expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.token.expires_in())
            .and_then(|lifetime| self.created_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Expired means strictly past `created_at + expires_in`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }

    /// Returns `true` if this context may run `command`.
    pub fn can_execute(&self, command: &Command) -> bool {
        capabilities_intersect(self.capabilities, command.required_capabilities())
    }
}

impl fmt::Debug for AuthenticationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationContext")
            .field("label", &self.label)
            .field("token", &self.token)
            .field("capabilities", &self.capabilities)
            .field("created_at", &self.created_at)
            .finish()
    }
}
