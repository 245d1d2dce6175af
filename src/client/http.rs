//! Client entry point and the command execution pipeline.

use std::sync::Arc;

use reqwest::header::{HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::api::{AccountService, CommentsService, SubredditsService, UsersService};
use crate::auth::{
    capabilities_intersect, strategy_for, AuthenticationContext, AuthenticationStrategy,
    Authenticator, Capability, Clock, Credentials, InMemorySessionStore, SessionStore,
    SystemClock, TokenEndpoint,
};
use crate::command::Command;
use crate::models::FromThing;
use crate::rate_limit::RateLimiter;
use crate::{Error, Result};

use super::config::ClientConfig;
use super::paginated::{ListingStream, ListingStreamBuilder, PaginationOptions};
use super::transport::{HttpRequest, HttpResponse, RequestAuth, ReqwestTransport, Transport};

/// The main client for interacting with the Reddit API.
///
/// Cloning is cheap; clones share the authenticator, rate limiter, and
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use reddit_rs::{Credentials, PaginationOptions, RedditClient};
///
/// # async fn example() -> reddit_rs::Result<()> {
/// let client = RedditClient::new(Credentials::read_only("client-id", "client-secret")?)?;
///
/// let about = client.subreddits().about("rust").await?;
/// println!("{} subscribers", about.subscribers.unwrap_or_default());
///
/// let mut hot = client.subreddits().hot("rust", PaginationOptions::default());
/// while let Some(post) = hot.next().await {
///     println!("{}", post?.title);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedditClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) authenticator: Authenticator,
    pub(crate) rate_limiter: Option<RateLimiter>,
    pub(crate) api_base: Url,
    pub(crate) config: ClientConfig,
}

impl RedditClient {
    /// Create a client with default configuration.
    ///
    /// Must be called inside a Tokio runtime when rate limiting is enabled
    /// (the default).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    /// Create a client with custom configuration.
    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        Self::builder(credentials).config(config).build()
    }

    /// Start building a client.
    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    /// Get the subreddits service.
    pub fn subreddits(&self) -> SubredditsService {
        SubredditsService::new(self.inner.clone())
    }

    /// Get the service for the signed-in account.
    pub fn account(&self) -> AccountService {
        AccountService::new(self.inner.clone())
    }

    /// Get the users service.
    pub fn users(&self) -> UsersService {
        UsersService::new(self.inner.clone())
    }

    /// Get the comments service.
    pub fn comments(&self) -> CommentsService {
        CommentsService::new(self.inner.clone())
    }

    /// Run a command under the shared authentication context.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthorizationMismatch`] before any network call if the
    ///   credentials can never satisfy the command
    /// - authentication errors from obtaining the context
    /// - [`Error::RateLimitExhausted`] if no permit could be obtained
    /// - [`Error::ApiValidation`] or [`Error::Transport`] for non-2xx responses
    pub async fn execute(&self, command: &Command) -> Result<HttpResponse> {
        self.inner.execute(command).await
    }

    /// Run a command under an explicit context, or unauthenticated with `None`.
    pub async fn execute_with_context(
        &self,
        command: &Command,
        context: Option<&AuthenticationContext>,
    ) -> Result<HttpResponse> {
        self.inner.execute_with_context(command, context).await
    }

    /// Run a command and decode the response as `T`.
    pub async fn fetch<T: FromThing>(&self, command: &Command) -> Result<T> {
        self.inner.fetch(command).await
    }

    /// Page through a listing command lazily.
    pub fn listing<T: FromThing + 'static>(
        &self,
        command: Command,
        options: PaginationOptions,
    ) -> ListingStream<T> {
        ListingStreamBuilder::new(self.inner.clone(), command)
            .options(options)
            .build()
    }

    /// The shared authenticator.
    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    /// The shared rate limiter, if limiting is enabled.
    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.inner.rate_limiter.as_ref()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Drop the cached context and any persisted interactive session.
    pub async fn sign_out(&self) -> Result<()> {
        self.inner.authenticator.sign_out().await
    }
}

impl std::fmt::Debug for RedditClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditClient")
            .field("config", &self.inner.config)
            .field("authenticator", &self.inner.authenticator)
            .finish()
    }
}

/// Builder for [`RedditClient`].
pub struct ClientBuilder {
    credentials: Credentials,
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    session_store: Option<Arc<dyn SessionStore>>,
    clock: Option<Arc<dyn Clock>>,
    strategy: Option<Box<dyn AuthenticationStrategy>>,
}

impl ClientBuilder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            config: ClientConfig::default(),
            transport: None,
            session_store: None,
            clock: None,
            strategy: None,
        }
    }

    /// Use a custom configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Send requests through a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Persist interactive sessions in a custom store.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Measure token expiry with a custom clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the strategy derived from the credentials.
    pub fn authentication_strategy(mut self, strategy: Box<dyn AuthenticationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// - [`Error::UrlParse`] for malformed base URLs
    /// - [`Error::Config`] for an invalid rate limit, or when rate limiting
    ///   is enabled outside a Tokio runtime
    pub fn build(self) -> Result<RedditClient> {
        let config = self.config;
        let api_base = config.api_base()?;
        let auth_base = config.auth_base()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&config)?),
        };

        let strategy = match self.strategy {
            Some(strategy) => strategy,
            None => {
                let endpoint = TokenEndpoint::new(
                    transport.clone(),
                    &auth_base,
                    config.user_agent.clone(),
                    self.credentials.client_id(),
                    self.credentials.client_secret().clone(),
                )?;
                let store = self
                    .session_store
                    .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));
                strategy_for(&self.credentials, endpoint, store)
            }
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let authenticator = Authenticator::with_clock(strategy, clock);

        let rate_limiter = config
            .rate_limit
            .clone()
            .map(RateLimiter::new)
            .transpose()?;

        debug!(
            grant = authenticator.label(),
            api_base = %api_base,
            rate_limited = rate_limiter.is_some(),
            "Client built"
        );

        Ok(RedditClient {
            inner: Arc::new(ClientInner {
                transport,
                authenticator,
                rate_limiter,
                api_base,
                config,
            }),
        })
    }
}

fn authorization_mismatch(command: &Command, context: &str, granted: &[Capability]) -> Error {
    Error::AuthorizationMismatch {
        command: command.id().to_string(),
        context: context.to_string(),
        required: command.required_capabilities().to_vec(),
        granted: granted.to_vec(),
    }
}

impl ClientInner {
    pub(crate) async fn execute(&self, command: &Command) -> Result<HttpResponse> {
        // Every context this authenticator issues carries the same tags, so
        // an impossible command fails without requesting a token.
        let granted = self.authenticator.capabilities();
        if !capabilities_intersect(granted, command.required_capabilities()) {
            return Err(authorization_mismatch(
                command,
                self.authenticator.label(),
                granted,
            ));
        }

        let context = self.authenticator.context().await?;
        self.execute_with_context(command, Some(&context)).await
    }

    #[instrument(skip_all, fields(command = command.id()))]
    pub(crate) async fn execute_with_context(
        &self,
        command: &Command,
        context: Option<&AuthenticationContext>,
    ) -> Result<HttpResponse> {
        if let Some(ctx) = context {
            if !ctx.can_execute(command) {
                return Err(authorization_mismatch(command, ctx.label(), ctx.capabilities()));
            }
        }

        if let Some(limiter) = &self.rate_limiter {
            let lease = limiter.acquire(1).await?;
            if !lease.is_acquired() {
                return Err(Error::RateLimitExhausted);
            }
        }

        let request = self.build_request(command, context)?;
        debug!(method = %request.method, url = %request.url, "Sending request");

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "Request failed");
            return Err(Error::from_api_response(response.status, &response.body));
        }

        Ok(response)
    }

    pub(crate) async fn fetch<T: FromThing>(&self, command: &Command) -> Result<T> {
        let body: Value = self.execute(command).await?.parse()?;
        T::from_thing(body)
    }

    fn build_request(
        &self,
        command: &Command,
        context: Option<&AuthenticationContext>,
    ) -> Result<HttpRequest> {
        let descriptor = command.request();
        let mut url = self
            .api_base
            .join(descriptor.path.trim_start_matches('/'))?;
        if !descriptor.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&descriptor.query);
        }

        let mut request = HttpRequest::new(descriptor.method.clone(), url);
        request.headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .map_err(|_| Error::Config("Invalid user agent".to_string()))?,
        );
        request.auth = context.map(|ctx| RequestAuth::Bearer(ctx.access_token().clone()));
        request.body = descriptor.body.clone();

        Ok(request)
    }
}
