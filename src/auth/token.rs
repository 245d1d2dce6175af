//! OAuth tokens and the token endpoint.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::client::transport::{HttpRequest, RequestAuth, RequestBody, Transport};
use crate::{Error, Result};

/// Grant type for installed applications without a user.
pub const INSTALLED_CLIENT_GRANT: &str = "https://oauth.reddit.com/grants/installed_client";

/// An access token issued by the token endpoint.
#[derive(Clone)]
pub struct Token {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    token_type: String,
    expires_in: i64,
    scope: String,
}

impl Token {
    /// Create a bearer token with no refresh token and empty scope.
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
            token_type: "bearer".to_string(),
            expires_in,
            scope: String::new(),
        }
    }

    /// Attach a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    /// Set the granted scope string.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// The access token.
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// The refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    /// Token type, `bearer` unless the server says otherwise.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Lifetime in seconds from issuance.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Space-separated scopes granted.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Keep `previous`'s refresh token when the refresh response omits one.
    pub(crate) fn inherit_refresh_token(mut self, previous: &Token) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = previous.refresh_token.clone();
        }
        self
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The token endpoint answers 200 with an `error` member for bad grants.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    error: Option<String>,
}

/// A grant request sent to the token endpoint.
#[derive(Clone)]
pub(crate) enum Grant {
    ClientCredentials,
    InstalledClient { device_id: String },
    Password { username: String, password: SecretString },
    RefreshToken(SecretString),
    AuthorizationCode { code: String, redirect_uri: String },
}

impl Grant {
    fn name(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::InstalledClient { .. } => INSTALLED_CLIENT_GRANT,
            Grant::Password { .. } => "password",
            Grant::RefreshToken(_) => "refresh_token",
            Grant::AuthorizationCode { .. } => "authorization_code",
        }
    }

    fn into_form(self) -> Vec<(String, String)> {
        let mut form = vec![("grant_type".to_string(), self.name().to_string())];
        match self {
            Grant::ClientCredentials => {}
            Grant::InstalledClient { device_id } => {
                form.push(("device_id".to_string(), device_id));
            }
            Grant::Password { username, password } => {
                form.push(("username".to_string(), username));
                form.push(("password".to_string(), password.expose_secret().to_string()));
            }
            Grant::RefreshToken(token) => {
                form.push(("refresh_token".to_string(), token.expose_secret().to_string()));
            }
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("code".to_string(), code));
                form.push(("redirect_uri".to_string(), redirect_uri));
            }
        }
        form
    }
}

/// Client for `POST /api/v1/access_token`.
///
/// Requests are form-encoded and authenticated with HTTP Basic using the
/// OAuth client id and secret. They bypass the rate limiter.
#[derive(Clone)]
pub(crate) struct TokenEndpoint {
    transport: Arc<dyn Transport>,
    url: Url,
    user_agent: String,
    client_id: String,
    client_secret: SecretString,
}

impl TokenEndpoint {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        auth_base_url: &Url,
        user_agent: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Result<Self> {
        Ok(Self {
            transport,
            url: auth_base_url.join("api/v1/access_token")?,
            user_agent: user_agent.into(),
            client_id: client_id.into(),
            client_secret,
        })
    }

    #[instrument(skip_all, fields(grant = grant.name()))]
    pub(crate) async fn request(&self, grant: Grant) -> Result<Token> {
        let mut request = HttpRequest::new(Method::POST, self.url.clone());
        request.auth = Some(RequestAuth::Basic {
            username: self.client_id.clone(),
            password: self.client_secret.clone(),
        });
        request.body = RequestBody::Form(grant.into_form());
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            request.headers.insert(USER_AGENT, value);
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(Error::Authentication(format!(
                "Token request failed ({}): {}",
                response.status,
                String::from_utf8_lossy(&response.body)
            )));
        }

        let parsed: TokenResponse = response.parse()?;
        if let Some(error) = parsed.error {
            return Err(Error::Authentication(format!(
                "Token request rejected: {error}"
            )));
        }
        let access_token = parsed.access_token.ok_or_else(|| {
            Error::Authentication("Token response is missing access_token".to_string())
        })?;

        let expires_in = parsed.expires_in.ok_or_else(|| {
            Error::Authentication("Token response is missing expires_in".to_string())
        })?;

        debug!(expires_in, scope = %parsed.scope, "Token issued");

        Ok(Token {
            access_token: SecretString::from(access_token),
            refresh_token: parsed.refresh_token.map(SecretString::from),
            token_type: parsed.token_type,
            expires_in,
            scope: parsed.scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::mock::MockTransport;
    use crate::client::transport::HttpResponse;
    use serde_json::json;

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

    #[test]
    fn test_token_debug_redacts() {
        let token = Token::new("very-secret-access", 3600).with_refresh_token("very-secret-refresh");
        let debug_str = format!("{token:?}");

        assert!(!debug_str.contains("very-secret-access"));
        assert!(!debug_str.contains("very-secret-refresh"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_grant_forms() {
        let form = Grant::InstalledClient {
            device_id: "DO_NOT_TRACK_THIS_DEVICE".to_string(),
        }
        .into_form();
        assert_eq!(form[0].1, INSTALLED_CLIENT_GRANT);
        assert_eq!(form[1], ("device_id".to_string(), "DO_NOT_TRACK_THIS_DEVICE".to_string()));

        let form = Grant::AuthorizationCode {
            code: "abc".to_string(),
            redirect_uri: "http://localhost:8080/cb".to_string(),
        }
        .into_form();
        assert_eq!(form[0].1, "authorization_code");
        assert_eq!(form.len(), 3);
    }

    #[tokio::test]
    async fn test_request_sends_basic_auth_form() {
        let transport = Arc::new(MockTransport::new(|_| {
            HttpResponse::json(&json!({
                "access_token": "T1",
                "expires_in": 3600
            }))
        }));
        let token = endpoint(transport.clone())
            .request(Grant::ClientCredentials)
            .await
            .unwrap();

        assert_eq!(token.access_token().expose_secret(), "T1");
        assert_eq!(token.token_type(), "bearer");
        assert_eq!(token.scope(), "");
        assert!(token.refresh_token().is_none());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url.path(), "/api/v1/access_token");
        assert_eq!(requests[0].form_value("grant_type"), Some("client_credentials"));
        assert!(matches!(
            requests[0].auth,
            Some(RequestAuth::Basic { ref username, .. }) if username == "cid"
        ));
    }

    #[tokio::test]
    async fn test_error_member_is_authentication_failure() {
        let transport = Arc::new(MockTransport::new(|_| {
            HttpResponse::json(&json!({ "error": "invalid_grant" }))
        }));
        let err = endpoint(transport)
            .request(Grant::Password {
                username: "u".to_string(),
                password: SecretString::from("p".to_string()),
            })
            .await
            .unwrap_err();

        assert!(err.is_auth_error());
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_missing_expires_in_is_authentication_failure() {
        let transport = Arc::new(MockTransport::new(|_| {
            HttpResponse::json(&json!({ "access_token": "T1" }))
        }));
        let err = endpoint(transport)
            .request(Grant::ClientCredentials)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(ref msg) if msg.contains("expires_in")));
    }

    #[tokio::test]
    async fn test_huge_expires_in_does_not_panic() {
        let transport = Arc::new(MockTransport::new(|_| {
            HttpResponse::json(&json!({
                "access_token": "T1",
                "expires_in": 9_000_000_000_000_000_i64
            }))
        }));
        let token = endpoint(transport)
            .request(Grant::ClientCredentials)
            .await
            .unwrap();

        let ctx = crate::auth::AuthenticationContext::new(
            "test",
            token,
            crate::auth::APPLICATION_ONLY,
            chrono::Utc::now(),
        );
        assert!(!ctx.is_expired(chrono::Utc::now()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_authentication_failure() {
        let transport = Arc::new(MockTransport::new(|_| HttpResponse::new(401, "nope")));
        let err = endpoint(transport)
            .request(Grant::ClientCredentials)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_inherit_refresh_token() {
        let previous = Token::new("old", 3600).with_refresh_token("R");
        let refreshed = Token::new("new", 3600).inherit_refresh_token(&previous);

        assert_eq!(
            refreshed.refresh_token().map(|t| t.expose_secret().to_string()),
            Some("R".to_string())
        );
    }
}
