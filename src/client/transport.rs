//! Transport seam between the execution pipeline and the network.
//!
//! The pipeline and the authenticator only ever talk to a [`Transport`].
//! [`ReqwestTransport`] is the production implementation; tests plug in
//! their own to count or script calls.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::Result;

use super::config::ClientConfig;

/// Body of an outbound request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
    /// JSON document
    Json(serde_json::Value),
}

/// Credentials attached to a request by the transport.
#[derive(Clone)]
pub enum RequestAuth {
    /// HTTP Basic, used against the token endpoint
    Basic {
        /// OAuth client id
        username: String,
        /// OAuth client secret
        password: SecretString,
    },
    /// `Authorization: Bearer <token>`
    Bearer(SecretString),
}

impl std::fmt::Debug for RequestAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            RequestAuth::Bearer(_) => f.write_str("Bearer([REDACTED])"),
        }
    }
}

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including query
    pub url: Url,
    /// Extra headers (the client identifier is always present)
    pub headers: HeaderMap,
    /// Authorization to apply
    pub auth: Option<RequestAuth>,
    /// Request body
    pub body: RequestBody,
}

impl HttpRequest {
    /// Create a request with no headers, auth, or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            auth: None,
            body: RequestBody::Empty,
        }
    }

    /// Returns the bearer token attached to this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        match &self.auth {
            Some(RequestAuth::Bearer(token)) => Some(token.expose_secret()),
            _ => None,
        }
    }

    /// Returns the value of a form field, if the body is a form.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// A raw response as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response from a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a `200 OK` response carrying a JSON document.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body is not valid JSON for `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Capability to send a request and receive the response.
///
/// Implementations report connection failures as errors and return every
/// HTTP status, including non-2xx, as a normal [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport using the timeout and user agent from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the TLS backend cannot be initialised.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest` client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.auth {
            Some(RequestAuth::Basic { username, password }) => {
                builder.basic_auth(username, Some(password.expose_secret()))
            }
            Some(RequestAuth::Bearer(token)) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        };

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Json(value) => builder.json(&value),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scriptable transport for unit tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

    /// Transport that answers through a closure and records every call.
    pub(crate) struct MockTransport {
        handler: Handler,
        delay: Duration,
        calls: AtomicUsize,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        pub(crate) fn new<F>(handler: F) -> Self
        where
            F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
        {
            Self {
                handler: Box::new(handler),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Suspend every send for `delay` before answering.
        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn calls_to(&self, path: &str) -> usize {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.url.path() == path)
                .count()
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok((self.handler)(&request))
        }
    }
}
