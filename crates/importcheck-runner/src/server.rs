//! The server-under-test seam
//!
//! The harness never owns the server. Anything that can answer a GET for a
//! path-and-query string implements [`ImportServer`]; [`HttpTarget`] does so
//! over real HTTP with reqwest.

use std::collections::HashMap;
use std::time::Duration;

use importcheck_core::Config;

/// Response as seen by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpResponse {
    /// JSON response with the given status.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        }
    }
}

/// The request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("reading body failed: {0}")]
    Body(String),
}

/// Something that answers GET requests.
///
/// `Sync` because cases may be issued from several threads at once; the
/// harness assumes no session affinity between requests.
pub trait ImportServer: Sync {
    /// Issue `GET {path_and_query}`. The query is already percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    fn get(&self, path_and_query: &str) -> Result<HttpResponse, TransportError>;
}

/// Adapter turning a closure into an [`ImportServer`].
pub struct ServerFn<F>(F);

/// Wrap a closure as an in-process server, e.g. a router under test.
pub fn server_fn<F>(f: F) -> ServerFn<F>
where
    F: Fn(&str) -> Result<HttpResponse, TransportError> + Sync,
{
    ServerFn(f)
}

impl<F> ImportServer for ServerFn<F>
where
    F: Fn(&str) -> Result<HttpResponse, TransportError> + Sync,
{
    fn get(&self, path_and_query: &str) -> Result<HttpResponse, TransportError> {
        (self.0)(path_and_query)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
    #[error("HTTP error: {0}")]
    Http(String),
}

/// A live server reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    base_url: String,
    client: reqwest::blocking::Client,
    headers: HashMap<String, String>,
}

impl HttpTarget {
    /// Target with the default 10s client timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not http(s) or the client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RunnerError> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// # Errors
    ///
    /// Returns error if the base URL is not http(s) or the client fails to build.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RunnerError> {
        let base_url = base_url.into();
        if reqwest::Url::parse(&base_url).is_err()
            || !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(RunnerError::InvalidBaseUrl(base_url));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunnerError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            headers: HashMap::new(),
        })
    }

    /// Build from a project config (base URL, timeout, headers).
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        Ok(Self::with_timeout(&config.base_url, Duration::from_secs(config.timeout_secs))?
            .with_headers(config.headers.clone()))
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ImportServer for HttpTarget {
    fn get(&self, path_and_query: &str) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{path_and_query}", self.base_url);

        let mut req = self.client.get(&url).header("Accept", "application/json");
        for (k, v) in &self.headers {
            req = req.header(k, v);
        }

        let resp = req
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}
