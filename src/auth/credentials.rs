//! Application credentials and the builder that validates them.

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::token::Token;
use crate::{Error, Result};

/// How a non-interactive client obtains its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonInteractiveMode {
    /// `client_credentials` grant; application-only access
    ReadOnly,
    /// Installed-client grant identified by a device id; application-only
    InstalledClient,
    /// `password` grant for a script app acting as its owner
    Password,
}

/// Registered application type for the authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveMode {
    /// Confidential client with a secret
    WebApp,
    /// Public client; the secret is empty
    InstalledApp,
}

/// Lifetime of an interactive grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantDuration {
    /// Access token only, roughly one hour
    #[default]
    Temporary,
    /// Access token plus a refresh token
    Permanent,
}

impl GrantDuration {
    fn as_str(self) -> &'static str {
        match self {
            GrantDuration::Temporary => "temporary",
            GrantDuration::Permanent => "permanent",
        }
    }
}

/// Credentials for grants that need no user interaction.
#[derive(Clone)]
pub struct NonInteractiveCredentials {
    pub(crate) mode: NonInteractiveMode,
    pub(crate) client_id: String,
    pub(crate) client_secret: SecretString,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<SecretString>,
    pub(crate) two_factor_code: Option<String>,
    pub(crate) device_id: Option<String>,
}

impl NonInteractiveCredentials {
    /// Which grant these credentials use.
    pub fn mode(&self) -> NonInteractiveMode {
        self.mode
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Password sent on the `password` grant.
    ///
    /// A one-time code is appended as `password:code`. The code is only
    /// valid once, so re-authentication after expiry fails for accounts
    /// with two-factor enabled.
    pub(crate) fn grant_password(&self) -> Option<SecretString> {
        let password = self.password.as_ref()?;
        Some(match &self.two_factor_code {
            Some(code) => SecretString::from(format!("{}:{}", password.expose_secret(), code)),
            None => password.clone(),
        })
    }
}

/// Credentials for the authorization-code flow.
#[derive(Clone)]
pub struct InteractiveCredentials {
    pub(crate) mode: InteractiveMode,
    pub(crate) client_id: String,
    pub(crate) client_secret: SecretString,
    pub(crate) redirect_uri: Url,
    pub(crate) state: String,
    pub(crate) authorization_code: Option<String>,
    pub(crate) token: Option<Token>,
}

impl InteractiveCredentials {
    /// Registered application type.
    pub fn mode(&self) -> InteractiveMode {
        self.mode
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Session identifier; also the OAuth `state` parameter.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Redirect URI registered with the application.
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Build the URL the user visits to approve the application.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlParse`] if `auth_base_url` cannot be joined.
    ///
    /// # Example
    ///
    /// ```
    /// use reddit_rs::auth::{Credentials, GrantDuration};
    /// use url::Url;
    ///
    /// # fn example() -> reddit_rs::Result<()> {
    /// let credentials = Credentials::builder()
    ///     .client_id("my-client-id")
    ///     .client_secret("my-secret")
    ///     .interactive("http://localhost:8080/callback", "session-1")
    ///     .build()?;
    ///
    /// if let Some(interactive) = credentials.as_interactive() {
    ///     let url = interactive.authorization_url(
    ///         &Url::parse("https://www.reddit.com")?,
    ///         &["identity", "read"],
    ///         GrantDuration::Permanent,
    ///     )?;
    ///     println!("Visit {url}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn authorization_url(
        &self,
        auth_base_url: &Url,
        scopes: &[&str],
        duration: GrantDuration,
    ) -> Result<Url> {
        let mut url = auth_base_url.join("api/v1/authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("state", &self.state)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("duration", duration.as_str())
            .append_pair("scope", &scopes.join(" "));
        Ok(url)
    }
}

/// Application credentials.
#[derive(Clone)]
pub enum Credentials {
    /// Client-credentials, installed-client, or password grant
    NonInteractive(NonInteractiveCredentials),
    /// Authorization-code grant
    Interactive(InteractiveCredentials),
}

impl Credentials {
    /// Start building credentials.
    pub fn builder() -> CredentialsBuilder {
        CredentialsBuilder::default()
    }

    /// Shorthand for application-only credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either value is empty.
    pub fn read_only(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        Self::builder()
            .client_id(client_id)
            .client_secret(client_secret)
            .read_only()
            .build()
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        match self {
            Credentials::NonInteractive(c) => &c.client_id,
            Credentials::Interactive(c) => &c.client_id,
        }
    }

    pub(crate) fn client_secret(&self) -> &SecretString {
        match self {
            Credentials::NonInteractive(c) => &c.client_secret,
            Credentials::Interactive(c) => &c.client_secret,
        }
    }

    /// Interactive credentials, if that is what these are.
    pub fn as_interactive(&self) -> Option<&InteractiveCredentials> {
        match self {
            Credentials::Interactive(c) => Some(c),
            Credentials::NonInteractive(_) => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::NonInteractive(c) => f
                .debug_struct("NonInteractive")
                .field("mode", &c.mode)
                .field("client_id", &c.client_id)
                .field("client_secret", &"[REDACTED]")
                .field("username", &c.username)
                .field("password", &c.password.as_ref().map(|_| "[REDACTED]"))
                .field("device_id", &c.device_id)
                .finish(),
            Credentials::Interactive(c) => f
                .debug_struct("Interactive")
                .field("mode", &c.mode)
                .field("client_id", &c.client_id)
                .field("client_secret", &"[REDACTED]")
                .field("redirect_uri", &c.redirect_uri.as_str())
                .field("state", &c.state)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
enum BuilderMode {
    ReadOnly,
    InstalledClient {
        device_id: String,
    },
    Password {
        username: String,
        password: String,
    },
    Interactive {
        redirect_uri: String,
        state: String,
    },
}

/// Builder for [`Credentials`].
#[derive(Default)]
pub struct CredentialsBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    mode: Option<BuilderMode>,
    two_factor_code: Option<String>,
    installed_app: bool,
    authorization_code: Option<String>,
    token: Option<Token>,
}

impl CredentialsBuilder {
    /// Seed a builder from `REDDIT_*` environment variables.
    ///
    /// Reads `REDDIT_CLIENT_ID` and `REDDIT_CLIENT_SECRET`. If both
    /// `REDDIT_USERNAME` and `REDDIT_PASSWORD` are set the password grant is
    /// selected; otherwise `REDDIT_DEVICE_ID` selects the installed-client
    /// grant; otherwise the read-only grant. Missing values surface from
    /// [`build`](Self::build).
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let mut builder = Self::default();
        builder.client_id = var("REDDIT_CLIENT_ID");
        builder.client_secret = var("REDDIT_CLIENT_SECRET");
        builder.mode = Some(
            match (var("REDDIT_USERNAME"), var("REDDIT_PASSWORD"), var("REDDIT_DEVICE_ID")) {
                (Some(username), Some(password), _) => BuilderMode::Password { username, password },
                (_, _, Some(device_id)) => BuilderMode::InstalledClient { device_id },
                _ => BuilderMode::ReadOnly,
            },
        );
        builder
    }

    /// OAuth client id.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// OAuth client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Use the `client_credentials` grant.
    pub fn read_only(mut self) -> Self {
        self.mode = Some(BuilderMode::ReadOnly);
        self
    }

    /// Use the installed-client grant with the given device id.
    pub fn installed_client(mut self, device_id: impl Into<String>) -> Self {
        self.mode = Some(BuilderMode::InstalledClient {
            device_id: device_id.into(),
        });
        self
    }

    /// Use the `password` grant.
    pub fn password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.mode = Some(BuilderMode::Password {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// One-time code for accounts with two-factor authentication.
    pub fn two_factor_code(mut self, code: impl Into<String>) -> Self {
        self.two_factor_code = Some(code.into());
        self
    }

    /// Use the authorization-code flow. `state` doubles as the session id.
    pub fn interactive(mut self, redirect_uri: impl Into<String>, state: impl Into<String>) -> Self {
        self.mode = Some(BuilderMode::Interactive {
            redirect_uri: redirect_uri.into(),
            state: state.into(),
        });
        self
    }

    /// Mark an interactive application as a public installed app.
    pub fn installed_app(mut self) -> Self {
        self.installed_app = true;
        self
    }

    /// Code returned on the redirect after the user approved access.
    pub fn authorization_code(mut self, code: impl Into<String>) -> Self {
        self.authorization_code = Some(code.into());
        self
    }

    /// Resume an interactive session from a previously issued token.
    pub fn token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required value is missing or empty.
    pub fn build(self) -> Result<Credentials> {
        let client_id = non_empty(self.client_id, "client_id")?;
        let mode = self
            .mode
            .ok_or_else(|| Error::Config("authentication mode is not set".to_string()))?;

        match mode {
            BuilderMode::Interactive {
                redirect_uri,
                state,
            } => {
                let interactive_mode = if self.installed_app {
                    InteractiveMode::InstalledApp
                } else {
                    InteractiveMode::WebApp
                };
                let client_secret = match interactive_mode {
                    InteractiveMode::WebApp => non_empty(self.client_secret, "client_secret")?,
                    InteractiveMode::InstalledApp => self.client_secret.unwrap_or_default(),
                };
                let redirect_uri = Url::parse(&redirect_uri)
                    .map_err(|e| Error::Config(format!("invalid redirect_uri: {e}")))?;
                let state = non_empty(Some(state), "state")?;

                Ok(Credentials::Interactive(InteractiveCredentials {
                    mode: interactive_mode,
                    client_id,
                    client_secret: SecretString::from(client_secret),
                    redirect_uri,
                    state,
                    authorization_code: self.authorization_code,
                    token: self.token,
                }))
            }
            BuilderMode::ReadOnly => Ok(Credentials::NonInteractive(NonInteractiveCredentials {
                mode: NonInteractiveMode::ReadOnly,
                client_id,
                client_secret: SecretString::from(non_empty(self.client_secret, "client_secret")?),
                username: None,
                password: None,
                two_factor_code: None,
                device_id: None,
            })),
            BuilderMode::InstalledClient { device_id } => {
                let device_id = non_empty(Some(device_id), "device_id")?;
                if !(20..=30).contains(&device_id.len()) {
                    return Err(Error::Config(
                        "device_id must be between 20 and 30 characters".to_string(),
                    ));
                }
                Ok(Credentials::NonInteractive(NonInteractiveCredentials {
                    mode: NonInteractiveMode::InstalledClient,
                    client_id,
                    client_secret: SecretString::from(self.client_secret.unwrap_or_default()),
                    username: None,
                    password: None,
                    two_factor_code: None,
                    device_id: Some(device_id),
                }))
            }
            BuilderMode::Password { username, password } => {
                Ok(Credentials::NonInteractive(NonInteractiveCredentials {
                    mode: NonInteractiveMode::Password,
                    client_id,
                    client_secret: SecretString::from(non_empty(
                        self.client_secret,
                        "client_secret",
                    )?),
                    username: Some(non_empty(Some(username), "username")?),
                    password: Some(SecretString::from(non_empty(Some(password), "password")?)),
                    two_factor_code: self.two_factor_code,
                    device_id: None,
                }))
            }
        }
    }
}

fn non_empty(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Config(format!("{name} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_read_only() {
        let credentials = Credentials::read_only("cid", "csec").unwrap();
        match credentials {
            Credentials::NonInteractive(c) => {
                assert_eq!(c.mode(), NonInteractiveMode::ReadOnly);
                assert_eq!(c.client_id(), "cid");
            }
            other => panic!("Expected non-interactive credentials, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_values_are_config_errors() {
        let err = Credentials::builder().client_secret("csec").read_only().build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("client_id")));

        let err = Credentials::builder().client_id("cid").client_secret("csec").build().unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("mode")));

        let err = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .password("user", "")
            .build()
            .unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_installed_client_needs_no_secret() {
        let credentials = Credentials::builder()
            .client_id("cid")
            .installed_client("DO_NOT_TRACK_THIS_DEVICE")
            .build()
            .unwrap();
        assert!(matches!(
            credentials,
            Credentials::NonInteractive(ref c) if c.mode() == NonInteractiveMode::InstalledClient
        ));

        let err = Credentials::builder()
            .client_id("cid")
            .installed_client("short")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_two_factor_code_appended_to_password() {
        let credentials = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .password("user", "hunter2")
            .two_factor_code("123456")
            .build()
            .unwrap();

        let Credentials::NonInteractive(c) = credentials else {
            panic!("Expected non-interactive credentials");
        };
        assert_eq!(
            c.grant_password().unwrap().expose_secret(),
            "hunter2:123456"
        );
    }

    #[test]
    fn test_authorization_url() {
        let credentials = Credentials::builder()
            .client_id("cid")
            .client_secret("csec")
            .interactive("http://localhost:8080/callback", "abc123")
            .build()
            .unwrap();

        let url = credentials
            .as_interactive()
            .unwrap()
            .authorization_url(
                &Url::parse("https://www.reddit.com").unwrap(),
                &["identity", "read"],
                GrantDuration::Permanent,
            )
            .unwrap();

        assert_eq!(url.path(), "/api/v1/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("state".to_string(), "abc123".to_string())));
        assert!(pairs.contains(&("duration".to_string(), "permanent".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "identity read".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::builder()
            .client_id("cid")
            .client_secret("client-secret-value")
            .password("user", "password-value")
            .build()
            .unwrap();

        let debug_str = format!("{credentials:?}");
        assert!(!debug_str.contains("client-secret-value"));
        assert!(!debug_str.contains("password-value"));
    }
}
