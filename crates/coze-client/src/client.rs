//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{ChatApi, ConversationsApi, DatasetsApi, DocumentsApi, MessagesApi};
use crate::auth::{Auth, TokenAuth};
use crate::error::{Error, Result};
use crate::stream::ChatEventStream;
use crate::transport::{ApiRequest, HttpTransport, SharedTransport, Transport};

/// Base URL of the coze.cn deployment.
pub const BASE_URL_CN: &str = "https://api.coze.cn";

/// Base URL of the coze.com deployment.
pub const BASE_URL_COM: &str = "https://api.coze.com";

/// Environment variable holding the access token.
pub const TOKEN_ENV: &str = "COZE_API_TOKEN";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "COZE_API_BASE";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for establishing a connection.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for streaming requests.
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Coze API client.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use coze_client::{ChatRequest, CozeClient, Message};
///
/// # async fn example() -> coze_client::Result<()> {
/// let client = CozeClient::builder()
///     .auth_token("pat_xxx")
///     .build()?;
///
/// let request = ChatRequest::new("7370000000000", "user-1")
///     .with_message(Message::user_text("Hello"));
/// let chat = client.chat().create_and_poll(&request).await?;
/// println!("{}", chat.status);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CozeClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    transport: SharedTransport,
}

impl CozeClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from `COZE_API_TOKEN` and `COZE_API_BASE`.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_env().build()
    }

    /// Create a client over a custom transport.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    /// Create a client over an already shared transport.
    pub fn with_shared_transport(transport: SharedTransport) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport }),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        self.inner.transport.base_url()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the chat API.
    pub fn chat(&self) -> ChatApi {
        ChatApi::new(self.clone())
    }

    /// Access the conversations API.
    pub fn conversations(&self) -> ConversationsApi {
        ConversationsApi::new(self.clone())
    }

    /// Access the messages API.
    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.clone())
    }

    /// Access the knowledge datasets API.
    pub fn datasets(&self) -> DatasetsApi {
        DatasetsApi::new(self.clone())
    }

    /// Access the knowledge documents API.
    pub fn documents(&self) -> DocumentsApi {
        DocumentsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal request helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Send a request and return the whole response body.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
        self.inner.transport.send(request).await
    }

    /// Send a request and decode its `data` field.
    pub(crate) async fn send_data<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send_field(request, "data").await
    }

    /// Send a request and decode one top-level field of the body.
    pub(crate) async fn send_field<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        field: &'static str,
    ) -> Result<T> {
        let mut body = self.send(request).await?;
        match body.get_mut(field).map(serde_json::Value::take) {
            Some(serde_json::Value::Null) | None => Err(Error::MissingData(field)),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }

    /// Send a request and decode the whole body.
    pub(crate) async fn send_body<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.send(request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Send a request and decode the response as a chat event stream.
    pub(crate) async fn send_stream(&self, request: ApiRequest) -> Result<ChatEventStream> {
        let source = self.inner.transport.send_stream(request).await?;
        Ok(ChatEventStream::new(source))
    }
}

impl std::fmt::Debug for CozeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CozeClient")
            .field("base_url", &self.base_url().as_str())
            .finish()
    }
}

/// Builder for creating a CozeClient.
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    auth: Option<Arc<dyn Auth>>,
    timeout: Duration,
    connect_timeout: Duration,
    stream_timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            auth: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            user_agent: None,
        }
    }

    /// Create a builder seeded from `COZE_API_TOKEN` and `COZE_API_BASE`.
    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Some(token) = env_var(TOKEN_ENV) {
            builder = builder.auth_token(token);
        }
        if let Some(base_url) = env_var(BASE_URL_ENV) {
            builder = builder.base_url(base_url);
        }
        builder
    }

    /// Set the base URL. Defaults to [`BASE_URL_CN`].
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Authenticate with a personal access token.
    pub fn auth_token(self, token: impl Into<String>) -> Self {
        self.auth(Arc::new(TokenAuth::new(token)))
    }

    /// Authenticate with a custom credential provider.
    pub fn auth(mut self, auth: Arc<dyn Auth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the streaming request timeout.
    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CozeClient> {
        let auth = self
            .auth
            .ok_or_else(|| Error::Config("an auth token is required".to_string()))?;
        if auth.token().trim().is_empty() {
            return Err(Error::Config("auth token is empty".to_string()));
        }

        // Parse and normalize base URL
        let base_url = self.base_url.as_deref().unwrap_or(BASE_URL_CN);
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("coze-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .connect_timeout(self.connect_timeout)
            .build()?;

        tracing::debug!(base_url = %base_url, "Built Coze client");

        Ok(CozeClient::with_transport(HttpTransport::new(
            http,
            base_url,
            auth,
            self.timeout,
            self.stream_timeout,
        )))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use serde_json::json;

    #[test]
    fn test_builder_requires_auth() {
        let result = ClientBuilder::new().build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = ClientBuilder::new().auth_token("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_builder_defaults_to_cn() {
        let client = ClientBuilder::new().auth_token("pat").build().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.coze.cn/");
    }

    #[test]
    fn test_builder_normalizes_trailing_slash() {
        let client = ClientBuilder::new()
            .base_url(BASE_URL_COM)
            .auth_token("pat")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.coze.com/");

        let client = ClientBuilder::new()
            .base_url("http://localhost:8080/proxy")
            .auth_token("pat")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/proxy/");
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = ClientBuilder::new()
            .base_url("not a url")
            .auth_token("pat")
            .build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_send_field_missing_is_error() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(json!({"code": 0, "msg": ""}))
            .push_json(json!({"code": 0, "data": null}))
            .push_json(json!({"code": 0, "data": {"id": "x"}}));
        let client = CozeClient::with_shared_transport(mock.clone());

        let err = client
            .send_data::<serde_json::Value>(ApiRequest::get("/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingData("data")));
        assert!(client
            .send_data::<serde_json::Value>(ApiRequest::get("/b"))
            .await
            .is_err());

        let data: serde_json::Value = client.send_data(ApiRequest::get("/c")).await.unwrap();
        assert_eq!(data["id"], "x");
        assert_eq!(mock.request_count(), 3);
    }
}
