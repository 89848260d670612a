//! Request authentication.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::error::{Error, Result};

/// Supplies the credentials attached to every request.
pub trait Auth: Send + Sync + fmt::Debug {
    /// The access token.
    fn token(&self) -> &str;

    /// Headers carrying the credentials.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token()))
            .map_err(|_| Error::Config("Invalid auth token".to_string()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Personal access token authentication.
#[derive(Clone)]
pub struct TokenAuth {
    token: String,
}

impl TokenAuth {
    /// Create token auth.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Auth for TokenAuth {
    fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuth")
            .field("token", &"[redacted]")
            .finish()
    }
}
