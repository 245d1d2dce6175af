//! Error types for the Reddit API client.
//!
//! Every failure the execution engine can produce is a variant of [`Error`].
//! Nothing in this crate retries on its own: callers inspect the variant
//! (see [`Error::is_retryable`]) and decide.

use serde::Deserialize;
use thiserror::Error;

use crate::auth::Capability;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for all client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection-level HTTP failure (DNS, TLS, reset, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote API rejected the request with a structured error body.
    #[error("API error: status={status}, reason={reason:?}, message={message}")]
    ApiValidation {
        /// HTTP status code
        status: u16,
        /// Machine-readable reason, e.g. `SUBREDDIT_NOEXIST`
        reason: Option<String>,
        /// Human-readable message
        message: String,
        /// Longer explanation, when the API provides one
        explanation: Option<String>,
        /// Offending request fields
        fields: Vec<String>,
    },

    /// Non-2xx response without a structured error body.
    #[error("Transport error: status={status}")]
    Transport {
        /// HTTP status code
        status: u16,
        /// Raw response body for debugging
        body: String,
    },

    /// The token endpoint refused to issue a token.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The authentication context lacks every capability the command accepts.
    #[error("Command `{command}` requires one of {required:?}, context `{context}` grants {granted:?}")]
    AuthorizationMismatch {
        /// Command identifier
        command: String,
        /// Label of the authentication context
        context: String,
        /// Capabilities the command accepts
        required: Vec<Capability>,
        /// Capabilities the context carries
        granted: Vec<Capability>,
    },

    /// The rate limiter could not hand out a permit (queue saturated).
    #[error("Rate limit exhausted; back off before retrying")]
    RateLimitExhausted,

    /// A response could not be mapped to the requested entity type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Invalid input provided to a function
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Structured error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    reason: Option<String>,
    message: String,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    fields: Vec<String>,
}

impl Error {
    /// Returns `true` if this error is potentially transient and the
    /// operation could be retried by the caller.
    ///
    /// # Example
    ///
    /// ```
    /// use reddit_rs::Error;
    ///
    /// fn handle_error(err: Error) {
    ///     if err.is_retryable() {
    ///         println!("Backing off before trying again...");
    ///     }
    /// }
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimitExhausted => true,
            Error::Transport { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is an authentication or authorization error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::Authentication(_) | Error::AuthorizationMismatch { .. } => true,
            Error::Transport { status, .. } | Error::ApiValidation { status, .. } => {
                *status == 401 || *status == 403
            }
            _ => false,
        }
    }

    /// Returns `true` if this error is a caller bug (bad input or config).
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Config(_))
    }

    /// Returns `true` if the response body could not be decoded.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::Decode(_) | Error::Json(_))
    }

    /// HTTP status code attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiValidation { status, .. } | Error::Transport { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Build an error from a non-2xx response.
    ///
    /// A body matching `{reason, message, explanation, fields}` becomes
    /// [`Error::ApiValidation`]; anything else is a [`Error::Transport`].
    pub(crate) fn from_api_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ApiErrorBody>(body) {
            Ok(parsed) => Error::ApiValidation {
                status,
                reason: parsed.reason,
                message: parsed.message,
                explanation: parsed.explanation,
                fields: parsed.fields,
            },
            Err(_) => Error::Transport {
                status,
                body: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }
}
