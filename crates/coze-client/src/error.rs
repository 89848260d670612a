//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response body could be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response envelope carried a non-zero `code`.
    #[error("API error ({code}): {message}")]
    Api {
        /// Error code from the envelope.
        code: i64,
        /// Error message from the envelope.
        message: String,
        /// Value of the `X-Tt-Logid` response header, for support requests.
        log_id: Option<String>,
    },

    /// Non-success HTTP status without a decodable error envelope.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A field the operation depends on was absent from the response.
    #[error("Invalid response: missing {0} field")]
    MissingData(&'static str),

    /// `create_and_poll` gave up waiting for a terminal status.
    #[error("Chat polling timed out after {} seconds", .timeout.as_secs())]
    PollTimeout {
        /// The configured timeout.
        timeout: Duration,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The byte source of an event stream failed mid-stream.
    #[error("Stream error: {0}")]
    Stream(String),
}

impl Error {
    /// Check if this is an API-level (envelope) error.
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::Api { .. })
    }

    /// The envelope error code, if this is an API error.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The server log id attached to an API error, if any.
    pub fn log_id(&self) -> Option<&str> {
        match self {
            Error::Api { log_id, .. } => log_id.as_deref(),
            _ => None,
        }
    }

    /// Check if this is a polling timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::PollTimeout { .. })
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Status { status: 401, .. })
            || matches!(self, Error::Api { code: 4100 | 4101, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Status { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
