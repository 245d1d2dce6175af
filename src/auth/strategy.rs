//! One authentication strategy per credential mode.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::context::{AuthenticationContext, Capability, APPLICATION_ONLY, USER_CONTEXT};
use super::credentials::{Credentials, InteractiveCredentials, NonInteractiveCredentials, NonInteractiveMode};
use super::store::SessionStore;
use super::token::{Grant, Token, TokenEndpoint};
use crate::{Error, Result};

/// Obtains and renews tokens for one kind of grant.
///
/// Strategies only talk to the token endpoint; caching, expiry, and
/// concurrency are handled by [`Authenticator`](super::Authenticator).
#[async_trait]
pub trait AuthenticationStrategy: Send + Sync {
    /// Name used in logs and authorization errors.
    fn label(&self) -> &str;

    /// Capability tags of every context this strategy produces.
    fn capabilities(&self) -> &'static [Capability];

    /// Obtain a fresh token.
    async fn authenticate(&self) -> Result<Token>;

    /// Obtain a replacement for an expired context.
    async fn refresh(&self, current: &AuthenticationContext) -> Result<Token>;

    /// Drop any persisted session state.
    async fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the strategy matching `credentials`.
pub(crate) fn strategy_for(
    credentials: &Credentials,
    endpoint: TokenEndpoint,
    store: Arc<dyn SessionStore>,
) -> Box<dyn AuthenticationStrategy> {
    match credentials {
        Credentials::NonInteractive(c) => match c.mode() {
            NonInteractiveMode::ReadOnly => Box::new(ClientCredentialsStrategy { endpoint }),
            NonInteractiveMode::InstalledClient => Box::new(InstalledClientStrategy {
                endpoint,
                device_id: c.device_id.clone().unwrap_or_default(),
            }),
            NonInteractiveMode::Password => Box::new(PasswordStrategy {
                endpoint,
                credentials: c.clone(),
            }),
        },
        Credentials::Interactive(c) => Box::new(InteractiveStrategy {
            endpoint,
            credentials: c.clone(),
            store,
        }),
    }
}

/// Refresh with the refresh token when one was issued, else run `grant` again.
async fn refresh_or_regrant(
    endpoint: &TokenEndpoint,
    current: &AuthenticationContext,
    grant: Grant,
) -> Result<Token> {
    match current.token().refresh_token() {
        Some(refresh_token) => Ok(endpoint
            .request(Grant::RefreshToken(refresh_token.clone()))
            .await?
            .inherit_refresh_token(current.token())),
        None => endpoint.request(grant).await,
    }
}

/// `client_credentials` grant.
pub(crate) struct ClientCredentialsStrategy {
    endpoint: TokenEndpoint,
}

#[async_trait]
impl AuthenticationStrategy for ClientCredentialsStrategy {
    fn label(&self) -> &str {
        "client-credentials"
    }

    fn capabilities(&self) -> &'static [Capability] {
        APPLICATION_ONLY
    }

    async fn authenticate(&self) -> Result<Token> {
        self.endpoint.request(Grant::ClientCredentials).await
    }

    async fn refresh(&self, current: &AuthenticationContext) -> Result<Token> {
        refresh_or_regrant(&self.endpoint, current, Grant::ClientCredentials).await
    }
}

/// Installed-client grant keyed by device id.
pub(crate) struct InstalledClientStrategy {
    endpoint: TokenEndpoint,
    device_id: String,
}

impl InstalledClientStrategy {
    fn grant(&self) -> Grant {
        Grant::InstalledClient {
            device_id: self.device_id.clone(),
        }
    }
}

#[async_trait]
impl AuthenticationStrategy for InstalledClientStrategy {
    fn label(&self) -> &str {
        "installed-client"
    }

    fn capabilities(&self) -> &'static [Capability] {
        APPLICATION_ONLY
    }

    async fn authenticate(&self) -> Result<Token> {
        self.endpoint.request(self.grant()).await
    }

    async fn refresh(&self, current: &AuthenticationContext) -> Result<Token> {
        refresh_or_regrant(&self.endpoint, current, self.grant()).await
    }
}

/// `password` grant for script applications.
pub(crate) struct PasswordStrategy {
    endpoint: TokenEndpoint,
    credentials: NonInteractiveCredentials,
}

impl PasswordStrategy {
    fn grant(&self) -> Result<Grant> {
        let username = self
            .credentials
            .username
            .clone()
            .ok_or_else(|| Error::Config("username is required".to_string()))?;
        let password = self
            .credentials
            .grant_password()
            .ok_or_else(|| Error::Config("password is required".to_string()))?;
        Ok(Grant::Password { username, password })
    }
}

#[async_trait]
impl AuthenticationStrategy for PasswordStrategy {
    fn label(&self) -> &str {
        "password"
    }

    fn capabilities(&self) -> &'static [Capability] {
        USER_CONTEXT
    }

    async fn authenticate(&self) -> Result<Token> {
        self.endpoint.request(self.grant()?).await
    }

    async fn refresh(&self, _current: &AuthenticationContext) -> Result<Token> {
        // No refresh token is issued for this grant. A two-factor code is
        // single use, so this fails for accounts that require one.
        if self.credentials.two_factor_code.is_some() {
            warn!("Re-authenticating a password grant with a one-time code");
        }
        self.authenticate().await
    }
}

/// Authorization-code grant with session persistence.
pub(crate) struct InteractiveStrategy {
    endpoint: TokenEndpoint,
    credentials: InteractiveCredentials,
    store: Arc<dyn SessionStore>,
}

impl InteractiveStrategy {
    async fn stored_token(&self) -> Option<Token> {
        match self.store.get(&self.credentials.state).await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Session store lookup failed; treating as a miss");
                None
            }
        }
    }

    async fn persist(&self, token: &Token) {
        if let Err(e) = self.store.put(&self.credentials.state, token).await {
            warn!(error = %e, "Failed to persist session");
        }
    }
}

#[async_trait]
impl AuthenticationStrategy for InteractiveStrategy {
    fn label(&self) -> &str {
        "interactive"
    }

    fn capabilities(&self) -> &'static [Capability] {
        USER_CONTEXT
    }

    async fn authenticate(&self) -> Result<Token> {
        if let Some(token) = &self.credentials.token {
            self.persist(token).await;
            return Ok(token.clone());
        }

        if let Some(token) = self.stored_token().await {
            debug!(state = %self.credentials.state, "Resumed stored session");
            return Ok(token);
        }

        let Some(code) = &self.credentials.authorization_code else {
            return Err(Error::Authentication(format!(
                "No stored session, token, or authorization code for state `{}`",
                self.credentials.state
            )));
        };

        info!(state = %self.credentials.state, "Exchanging authorization code");
        let token = self
            .endpoint
            .request(Grant::AuthorizationCode {
                code: code.clone(),
                redirect_uri: self.credentials.redirect_uri.to_string(),
            })
            .await?;

        self.persist(&token).await;
        Ok(token)
    }

    async fn refresh(&self, current: &AuthenticationContext) -> Result<Token> {
        let refresh_token = current.token().refresh_token().ok_or_else(|| {
            Error::Authentication(
                "Token expired and no refresh token was issued; re-run the authorization flow"
                    .to_string(),
            )
        })?;

        let token = self
            .endpoint
            .request(Grant::RefreshToken(refresh_token.clone()))
            .await?
            .inherit_refresh_token(current.token());
        self.persist(&token).await;
        Ok(token)
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.delete(&self.credentials.state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::InMemorySessionStore;
    use crate::client::transport::mock::MockTransport;
    use crate::client::transport::HttpResponse;
    use chrono::Utc;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::json;
    use url::Url;

    fn endpoint(transport: Arc<MockTransport>) -> TokenEndpoint {
        TokenEndpoint::new(
            transport,
            &Url::parse("https://www.reddit.com").unwrap(),
            "test-agent/1.0",
            "cid",
            SecretString::from("csec".to_string()),
        )
        .unwrap()
    }

    fn echo_grant_transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(|request| {
            let grant = request.form_value("grant_type").unwrap_or("?").to_string();
            let mut body = json!({ "access_token": format!("token-for-{grant}"), "expires_in": 3600 });
            if grant == "authorization_code" {
                body["refresh_token"] = json!("R1");
            }
            HttpResponse::json(&body)
        }))
    }

    fn interactive(code: Option<&str>) -> Credentials {
        let mut builder = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .interactive("http://localhost:8080/callback", "state-1");
        if let Some(code) = code {
            builder = builder.authorization_code(code);
        }
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn test_client_credentials_reruns_grant_without_refresh_token() {
        let transport = echo_grant_transport();
        let strategy = strategy_for(
            &Credentials::read_only("cid", "csec").unwrap(),
            endpoint(transport.clone()),
            Arc::new(InMemorySessionStore::new()),
        );
        assert_eq!(strategy.capabilities(), APPLICATION_ONLY);

        let token = strategy.authenticate().await.unwrap();
        let ctx = AuthenticationContext::new("t", token, APPLICATION_ONLY, Utc::now());
        let refreshed = strategy.refresh(&ctx).await.unwrap();

        assert_eq!(
            refreshed.access_token().expose_secret(),
            "token-for-client_credentials"
        );
        let grants: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.form_value("grant_type").unwrap().to_string())
            .collect();
        assert_eq!(grants, vec!["client_credentials", "client_credentials"]);
    }

    #[tokio::test]
    async fn test_refresh_uses_refresh_token_when_present() {
        let transport = echo_grant_transport();
        let strategy = strategy_for(
            &Credentials::read_only("cid", "csec").unwrap(),
            endpoint(transport.clone()),
            Arc::new(InMemorySessionStore::new()),
        );

        let ctx = AuthenticationContext::new(
            "t",
            Token::new("old", 3600).with_refresh_token("R0"),
            APPLICATION_ONLY,
            Utc::now(),
        );
        let refreshed = strategy.refresh(&ctx).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].form_value("grant_type"), Some("refresh_token"));
        assert_eq!(requests[0].form_value("refresh_token"), Some("R0"));
        assert_eq!(
            refreshed.refresh_token().unwrap().expose_secret(),
            "R0"
        );
    }

    #[tokio::test]
    async fn test_password_grant_sends_credentials() {
        let transport = echo_grant_transport();
        let credentials = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .password("spez", "hunter2")
            .build()
            .unwrap();
        let strategy = strategy_for(
            &credentials,
            endpoint(transport.clone()),
            Arc::new(InMemorySessionStore::new()),
        );
        assert_eq!(strategy.capabilities(), USER_CONTEXT);

        strategy.authenticate().await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].form_value("username"), Some("spez"));
        assert_eq!(requests[0].form_value("password"), Some("hunter2"));
    }

    #[tokio::test]
    async fn test_interactive_exchanges_code_and_persists() {
        let transport = echo_grant_transport();
        let store = Arc::new(InMemorySessionStore::new());
        let strategy = strategy_for(&interactive(Some("CODE")), endpoint(transport.clone()), store.clone());

        let token = strategy.authenticate().await.unwrap();
        assert_eq!(token.access_token().expose_secret(), "token-for-authorization_code");
        assert_eq!(transport.requests()[0].form_value("code"), Some("CODE"));

        let stored = store.get("state-1").await.unwrap().unwrap();
        assert_eq!(stored.access_token().expose_secret(), "token-for-authorization_code");

        strategy.sign_out().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_interactive_resumes_from_store_without_network() {
        let transport = echo_grant_transport();
        let store = Arc::new(InMemorySessionStore::new());
        store.put("state-1", &Token::new("stored", 3600)).await.unwrap();

        let strategy = strategy_for(&interactive(Some("CODE")), endpoint(transport.clone()), store);
        let token = strategy.authenticate().await.unwrap();

        assert_eq!(token.access_token().expose_secret(), "stored");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_interactive_supplied_token_wins_and_is_stored() {
        let transport = echo_grant_transport();
        let store = Arc::new(InMemorySessionStore::new());
        store.put("state-1", &Token::new("stale", 3600)).await.unwrap();

        let credentials = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .interactive("http://localhost:8080/callback", "state-1")
            .token(Token::new("supplied", 3600))
            .build()
            .unwrap();
        let strategy = strategy_for(&credentials, endpoint(transport.clone()), store.clone());

        let token = strategy.authenticate().await.unwrap();
        assert_eq!(token.access_token().expose_secret(), "supplied");
        let stored = store.get("state-1").await.unwrap().unwrap();
        assert_eq!(stored.access_token().expose_secret(), "supplied");
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_interactive_without_code_or_session_fails() {
        let transport = echo_grant_transport();
        let strategy = strategy_for(
            &interactive(None),
            endpoint(transport),
            Arc::new(InMemorySessionStore::new()),
        );

        let err = strategy.authenticate().await.unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_interactive_refresh_requires_refresh_token() {
        let transport = echo_grant_transport();
        let strategy = strategy_for(
            &interactive(None),
            endpoint(transport.clone()),
            Arc::new(InMemorySessionStore::new()),
        );

        let ctx = AuthenticationContext::new("t", Token::new("A", 3600), USER_CONTEXT, Utc::now());
        let err = strategy.refresh(&ctx).await.unwrap_err();

        assert!(err.is_auth_error());
        assert_eq!(transport.calls(), 0);
    }
}
