//! Page fetcher abstraction for retrieving HTML and JSON content.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, SearchError};

/// HTTP method used by a [`FetchRequest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Extra headers; a `User-Agent` here overrides the fetcher default.
    pub headers: Vec<(String, String)>,
    /// JSON body, sent with `POST`.
    pub json: Option<Value>,
    /// Overrides the fetcher's default timeout.
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    /// Creates a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            json: None,
            timeout: None,
        }
    }

    /// Creates a `POST` request with a JSON body.
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            json: Some(body),
            timeout: None,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns true if the caller supplied its own `User-Agent`.
    pub fn has_user_agent(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
    }
}

/// A response that made it back over the wire, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl FetchResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for fetching remote pages.
///
/// Implementations own retry and pacing; a returned `Err` means the source
/// should be treated as unavailable for this request.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Executes the request.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse>;

    /// Fetches `url` with `GET` and returns the body of a `200` response.
    async fn get_html(&self, url: &str) -> Result<String> {
        let response = self.fetch(FetchRequest::get(url)).await?;
        if !response.is_ok() {
            return Err(SearchError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}

/// Delay abstraction so backoff and throttling can be tested without waiting.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
