//! Commands: a request description paired with the capabilities it needs.
//!
//! A [`CommandDefinition`] is a static table entry. Binding it to call
//! parameters yields a [`Command`] that the client can execute.
//!
//! ```
//! use reddit_rs::auth::USER_CONTEXT;
//! use reddit_rs::command::{CommandDefinition, RequestDescriptor};
//!
//! fn controversial(subreddit: &str) -> RequestDescriptor {
//!     RequestDescriptor::get(format!("/r/{subreddit}/controversial"))
//! }
//!
//! const CONTROVERSIAL: CommandDefinition<str> =
//!     CommandDefinition::new("subreddit.controversial", USER_CONTEXT, controversial);
//!
//! let command = CONTROVERSIAL.bind("rust");
//! assert_eq!(command.request().path, "/r/rust/controversial");
//! ```

use reqwest::Method;

use crate::auth::Capability;
use crate::client::transport::RequestBody;

/// Method, path, query, and body of an API call, relative to the API base.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Path starting with `/`
    pub path: String,
    /// Query parameters in order
    pub query: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
}

impl RequestDescriptor {
    /// Describe a request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Describe a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Describe a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Append a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a form body.
    pub fn with_form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }

    /// Set a query parameter, replacing any existing value for `key`.
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key.to_string(), value)),
        }
    }

    /// Remove a query parameter.
    pub fn remove_query(&mut self, key: &str) {
        self.query.retain(|(k, _)| k != key);
    }

    /// Value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A request ready to run, plus the capabilities under which it may run.
#[derive(Debug, Clone)]
pub struct Command {
    id: &'static str,
    capabilities: &'static [Capability],
    request: RequestDescriptor,
}

impl Command {
    /// Create a command directly, without a definition.
    pub fn new(
        id: &'static str,
        capabilities: &'static [Capability],
        request: RequestDescriptor,
    ) -> Self {
        Self {
            id,
            capabilities,
            request,
        }
    }

    /// Stable identifier, e.g. `subreddit.hot`.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// A context may run this command if it has any of these.
    pub fn required_capabilities(&self) -> &'static [Capability] {
        self.capabilities
    }

    /// The request to send.
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub(crate) fn request_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.request
    }
}

/// Static description of an API command, parameterised by `P`.
pub struct CommandDefinition<P: ?Sized> {
    id: &'static str,
    capabilities: &'static [Capability],
    build: fn(&P) -> RequestDescriptor,
}

impl<P: ?Sized> CommandDefinition<P> {
    /// Declare a command.
    pub const fn new(
        id: &'static str,
        capabilities: &'static [Capability],
        build: fn(&P) -> RequestDescriptor,
    ) -> Self {
        Self {
            id,
            capabilities,
            build,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Capabilities accepted by this command.
    pub fn capabilities(&self) -> &'static [Capability] {
        self.capabilities
    }

    /// Produce a command for these parameters.
    pub fn bind(&self, params: &P) -> Command {
        Command::new(self.id, self.capabilities, (self.build)(params))
    }
}

impl<P: ?Sized> std::fmt::Debug for CommandDefinition<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("id", &self.id)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
