//! HTTP-based page fetcher using reqwest, with retry and request pacing.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::fetcher::{FetchRequest, FetchResponse, Method, PageFetcher, Sleeper, TokioSleeper};
use crate::{Result, SearchError};

/// A page fetcher that uses plain HTTP requests via reqwest.
///
/// Transport failures (connection errors, timeouts, broken bodies) are
/// retried according to the configured [`BackoffPolicy`](crate::BackoffPolicy).
/// Every successful request is followed by the configured throttle, taken
/// under a lock shared by all callers of this fetcher so concurrent adapters
/// are still paced one request at a time.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
    sleeper: Arc<dyn Sleeper>,
    pace: Mutex<()>,
}

impl HttpFetcher {
    /// Creates a new `HttpFetcher` with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Creates an `HttpFetcher` from a validated configuration.
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Creates an `HttpFetcher` with a custom reqwest client.
    pub fn with_client(client: Client, config: FetchConfig) -> Self {
        Self {
            client,
            config,
            sleeper: Arc::new(TokioSleeper),
            pace: Mutex::new(()),
        }
    }

    /// Replaces the sleeper used for backoff and throttling.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn send_once(&self, request: &FetchRequest) -> std::result::Result<FetchResponse, reqwest::Error> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.has_user_agent() {
            builder = builder.header(reqwest::header::USER_AGENT, self.config.user_agent.as_str());
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder
            .timeout(request.timeout.unwrap_or(self.config.timeout))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }

    async fn throttle(&self) {
        let _guard = self.pace.lock().await;
        self.sleeper.sleep(self.config.throttle).await;
    }
}

/// Connection problems, timeouts and broken bodies. Malformed requests are
/// not retried.
fn is_transport_failure(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let policy = &self.config.backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.send_once(&request).await {
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, attempt, "Fetched page");
                    self.throttle().await;
                    return Ok(response);
                }
                Err(e) if !is_transport_failure(&e) => {
                    warn!(url = %request.url, "Request cannot be sent: {}", e);
                    return Err(SearchError::Http(e));
                }
                Err(e) if attempt >= policy.max_attempts => {
                    warn!(url = %request.url, attempt, "Giving up after error: {}", e);
                    return Err(SearchError::Unavailable {
                        url: request.url,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        url = %request.url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Request error: {}; retrying",
                        e
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }
}
