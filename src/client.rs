//! Retrying HTTP client
//!
//! Every request goes through a freshly chosen egress endpoint and under a
//! rate-limiter permit. A failed attempt evicts the endpoint it used, backs
//! off exponentially, and retries through a new endpoint. The final attempt's
//! response is returned to the caller even when it carries an error status;
//! the caller decides whether "no data" is acceptable for that unit of work.

use crate::limiter::RateLimiter;
use crate::pool::EndpointPool;
use crate::{CrawlError, Result};
use reqwest::Response;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a retried request
///
/// A tagged result rather than an error: retry exhaustion with a live
/// response is data, not a fault.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response with a success status
    Success(Response),

    /// The final attempt's response, carrying a non-success status
    Exhausted(Response),
}

impl FetchOutcome {
    /// The response, whichever way the retries ended
    pub fn into_response(self) -> Response {
        match self {
            Self::Success(resp) | Self::Exhausted(resp) => resp,
        }
    }

    /// The response only if the retries ended in success
    pub fn ok(self) -> Option<Response> {
        match self {
            Self::Success(resp) => Some(resp),
            Self::Exhausted(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn status(&self) -> reqwest::StatusCode {
        match self {
            Self::Success(resp) | Self::Exhausted(resp) => resp.status(),
        }
    }
}

/// HTTP client with rate limiting, endpoint rotation, and retry
pub struct RetryingClient {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    pool: Arc<EndpointPool>,
    max_retries: u32,
}

impl RetryingClient {
    pub fn new(
        limiter: Arc<RateLimiter>,
        pool: Arc<EndpointPool>,
        max_retries: u32,
    ) -> Result<Self> {
        assert!(max_retries >= 1, "max_retries must be >= 1");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            limiter,
            pool,
            max_retries,
        })
    }

    /// GETs `path` through a rotating endpoint, with optional query pairs
    pub async fn get(&self, path: &str, query: Option<&[(&str, &str)]>) -> Result<FetchOutcome> {
        self.request(reqwest::Method::GET, path, query, None).await
    }

    /// POSTs `path` through a rotating endpoint, with optional form fields
    pub async fn post(&self, path: &str, form: Option<&[(&str, &str)]>) -> Result<FetchOutcome> {
        self.request(reqwest::Method::POST, path, None, form).await
    }

    async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        form: Option<&[(&str, &str)]>,
    ) -> Result<FetchOutcome> {
        let mut last_error: Option<(String, reqwest::Error)> = None;

        for attempt in 0..self.max_retries {
            let final_attempt = attempt + 1 == self.max_retries;

            // Endpoint choice is re-resolved per attempt; an eviction below
            // changes what the next attempt sees.
            let endpoint = self.pool.choose().await?;
            let url = format!("{}{}", endpoint.host, path);

            let mut builder = self.client.request(method.clone(), &url);
            if let Some(pairs) = query {
                builder = builder.query(pairs);
            }
            if let Some(fields) = form {
                builder = builder.form(fields);
            }

            let sent = {
                let _permit = self.limiter.acquire().await;
                builder.send().await
            };

            match sent {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(FetchOutcome::Success(resp));
                }
                Ok(resp) if final_attempt => {
                    tracing::warn!(
                        url = %url,
                        status = resp.status().as_u16(),
                        attempts = self.max_retries,
                        "retries exhausted, surfacing last response"
                    );
                    return Ok(FetchOutcome::Exhausted(resp));
                }
                Ok(resp) => {
                    tracing::warn!(
                        url = %url,
                        status = resp.status().as_u16(),
                        attempt = attempt + 1,
                        "request failed, rotating endpoint"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        error = %e,
                        attempt = attempt + 1,
                        "request errored, rotating endpoint"
                    );
                    last_error = Some((url.clone(), e));
                    if final_attempt {
                        break;
                    }
                }
            }

            // A failed attempt marks the endpoint as compromised.
            self.pool.remove_endpoint(&endpoint.host).await;

            // Backoff happens outside the permit so it does not hold a
            // rate-limit slot.
            tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
        }

        let (url, source) = last_error.expect("loop exits early unless an attempt errored");
        Err(CrawlError::RetriesExhausted {
            url,
            attempts: self.max_retries,
            source,
        })
    }
}
