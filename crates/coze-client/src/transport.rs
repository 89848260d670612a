//! Request transport.
//!
//! The [`Transport`] trait is the seam between the API clients and the
//! network. [`HttpTransport`] is the real implementation; tests substitute a
//! [`MockTransport`](crate::transport::MockTransport).

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use url::Url;

use crate::auth::Auth;
use crate::error::{Error, Result};

/// Response header carrying the server-side log id.
pub const LOG_ID_HEADER: &str = "x-tt-logid";

/// Raw response body, read incrementally.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A transport-agnostic API request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL, e.g. `/v3/chat`.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Headers that override the transport defaults.
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// A GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// A POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// A PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// A DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add every non-null field of a serializable struct as a query parameter,
    /// in declaration order.
    pub fn query_from<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        if let serde_json::Value::Object(fields) = serde_json::to_value(query)? {
            for (name, value) in fields {
                match value {
                    serde_json::Value::Null => {}
                    serde_json::Value::String(s) => self.query.push((name, s)),
                    other => self.query.push((name, other.to_string())),
                }
            }
        }
        Ok(self)
    }

    /// Set the JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Override a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Executes API requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Base URL requests are resolved against.
    fn base_url(&self) -> &Url;

    /// Send a request and return the decoded JSON body.
    ///
    /// Fails with [`Error::Api`] when the body's `code` field is non-zero.
    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value>;

    /// Send a request and return the raw response body as a byte stream.
    async fn send_stream(&self, request: ApiRequest) -> Result<ByteStream>;
}

/// Shared transport handle.
pub type SharedTransport = Arc<dyn Transport>;

/// Reject a decoded body whose envelope reports an error.
pub(crate) fn check_envelope(body: &serde_json::Value, log_id: Option<String>) -> Result<()> {
    let code = match body.get("code") {
        Some(code) => code
            .as_i64()
            .or_else(|| code.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0),
        None => return Ok(()),
    };
    if code == 0 {
        return Ok(());
    }

    let message = body
        .get("msg")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string();
    let log_id = log_id.or_else(|| {
        body.pointer("/detail/logid")
            .and_then(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    });

    Err(Error::Api {
        code,
        message,
        log_id,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP transport
// ─────────────────────────────────────────────────────────────────────────────

/// reqwest-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    auth: Arc<dyn Auth>,
    timeout: Duration,
    stream_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport. `base_url` must end with `/`.
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        auth: Arc<dyn Auth>,
        timeout: Duration,
        stream_timeout: Duration,
    ) -> Self {
        Self {
            http,
            base_url,
            auth,
            timeout,
            stream_timeout,
        }
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::from)
    }

    fn build(
        &self,
        request: &ApiRequest,
        timeout: Duration,
        extra: HeaderMap,
    ) -> Result<reqwest::RequestBuilder> {
        let url = self.url(&request.path)?;

        let mut headers = self.auth.headers()?;
        headers.extend(extra);
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::Config(format!("Invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Config(format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers)
            .timeout(timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }

    /// Decode a complete response, extracting the body or error.
    async fn handle_response(response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        let log_id = log_id(&response);
        let bytes = response.bytes().await?;

        let body: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(Error::Json(e)),
            Err(_) => {
                return Err(Error::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                })
            }
        };

        check_envelope(&body, log_id)?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }
        Ok(body)
    }
}

fn log_id(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(LOG_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

#[async_trait]
impl Transport for HttpTransport {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
        tracing::debug!(method = %request.method, path = %request.path, "Sending request");
        let response = self
            .build(&request, self.timeout, HeaderMap::new())?
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn send_stream(&self, request: ApiRequest) -> Result<ByteStream> {
        tracing::debug!(method = %request.method, path = %request.path, "Opening event stream");
        let mut extra = HeaderMap::new();
        extra.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let response = self
            .build(&request, self.stream_timeout, extra)?
            .send()
            .await?;

        // Request errors come back as a plain JSON envelope instead of SSE.
        if !response.status().is_success() || is_json(&response) {
            let body = Self::handle_response(response).await?;
            let bytes = Bytes::from(body.to_string());
            return Ok(Box::pin(futures::stream::once(async move { Ok::<_, Error>(bytes) })));
        }

        Ok(Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| Error::Stream(e.to_string()))
        })))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock transport
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(any(test, feature = "testing"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "testing"))]
mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// A transport that replays queued responses and records requests.
    ///
    /// JSON responses and stream bodies are queued separately and returned in
    /// order. Running out of responses is an error.
    pub struct MockTransport {
        base_url: Url,
        responses: Mutex<VecDeque<Result<serde_json::Value>>>,
        streams: Mutex<VecDeque<Vec<Bytes>>>,
        request_log: Mutex<Vec<ApiRequest>>,
    }

    impl MockTransport {
        /// Create a mock with no queued responses.
        pub fn new() -> Self {
            Self {
                // Constant literal, always parses.
                base_url: Url::parse("http://mock.invalid/").expect("valid mock URL"),
                responses: Mutex::new(VecDeque::new()),
                streams: Mutex::new(VecDeque::new()),
                request_log: Mutex::new(Vec::new()),
            }
        }

        /// Queue a JSON response body (envelope checks still apply).
        pub fn push_json(&self, body: serde_json::Value) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(body));
            self
        }

        /// Queue a failure.
        pub fn push_error(&self, error: Error) -> &Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        /// Queue a stream body delivered in the given chunks.
        pub fn push_stream<I, C>(&self, chunks: I) -> &Self
        where
            I: IntoIterator<Item = C>,
            C: Into<Bytes>,
        {
            let chunks = chunks.into_iter().map(Into::into).collect();
            self.streams.lock().unwrap().push_back(chunks);
            self
        }

        /// All requests made so far.
        pub fn requests(&self) -> Vec<ApiRequest> {
            self.request_log.lock().unwrap().clone()
        }

        /// Number of requests made so far.
        pub fn request_count(&self) -> usize {
            self.request_log.lock().unwrap().len()
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        fn base_url(&self) -> &Url {
            &self.base_url
        }

        async fn send(&self, request: ApiRequest) -> Result<serde_json::Value> {
            self.request_log.lock().unwrap().push(request);
            let next = self.responses.lock().unwrap().pop_front();
            let body = next.unwrap_or_else(|| {
                Err(Error::Config(
                    "MockTransport: no more responses available".to_string(),
                ))
            })?;
            check_envelope(&body, None)?;
            Ok(body)
        }

        async fn send_stream(&self, request: ApiRequest) -> Result<ByteStream> {
            self.request_log.lock().unwrap().push(request);
            let chunks = self.streams.lock().unwrap().pop_front().ok_or_else(|| {
                Error::Config("MockTransport: no more streams available".to_string())
            })?;
            Ok(Box::pin(futures::stream::iter(
                chunks.into_iter().map(Ok::<Bytes, Error>),
            )))
        }
    }
}
