//! Remote document sources.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Trait for anything that can fetch a JSON document by URL.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch and decode the JSON document at `url`.
    async fn fetch_json(&self, url: &str) -> FxResult<Value>;
}

/// HTTPS source backed by a shared `reqwest` client.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    /// Create a source whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fxwidget/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FxError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    fn transport_error(url: &str, err: reqwest::Error) -> FxError {
        if err.is_timeout() {
            FxError::Timeout {
                url: url.to_string(),
            }
        } else {
            FxError::Http {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        "https"
    }

    async fn fetch_json(&self, url: &str) -> FxResult<Value> {
        debug!(url, "Fetching document");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                Self::transport_error(url, e)
            } else {
                FxError::MalformedDocument(format!("{}: {}", url, e))
            }
        })
    }
}

/// Canned response for the mock source.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub enum MockResponse {
    Document(Value),
    Status(u16),
    Timeout,
}

/// Mock document source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockSource {
    name: String,
    responses: dashmap::DashMap<String, (MockResponse, Duration)>,
    requests: dashmap::DashMap<String, usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockSource {
    /// Create a new mock source. Unregistered URLs answer 404.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: dashmap::DashMap::new(),
            requests: dashmap::DashMap::new(),
        }
    }

    /// Serve `doc` at `url`.
    pub fn set_document(&self, url: impl Into<String>, doc: Value) {
        self.set_response(url, MockResponse::Document(doc), Duration::ZERO);
    }

    /// Serve `response` at `url` after `delay`.
    pub fn set_response(&self, url: impl Into<String>, response: MockResponse, delay: Duration) {
        self.responses.insert(url.into(), (response, delay));
    }

    /// Number of requests made for `url`.
    pub fn requests(&self, url: &str) -> usize {
        self.requests.get(url).map(|n| *n).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl DocumentSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_json(&self, url: &str) -> FxResult<Value> {
        *self.requests.entry(url.to_string()).or_insert(0) += 1;

        let entry = self.responses.get(url).map(|r| r.clone());
        let (response, delay) = entry.unwrap_or((MockResponse::Status(404), Duration::ZERO));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match response {
            MockResponse::Document(doc) => Ok(doc),
            MockResponse::Status(status) => Err(FxError::Status {
                url: url.to_string(),
                status,
            }),
            MockResponse::Timeout => Err(FxError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}
