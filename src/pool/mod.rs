//! Egress endpoint pool
//!
//! This module owns the set of live egress endpoints that requests rotate
//! across. Endpoints are provisioned at startup, evicted when a request
//! through them fails, and torn down (best effort, with retries) on shutdown.

mod provision;

pub use provision::{
    FirstSelector, HttpProvisioner, ProvisionError, Provisioner, RandomSelector, Selector,
    ALL_REGIONS,
};

use crate::{CrawlError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Number of teardown attempts before a stuck endpoint is abandoned
const TEARDOWN_ATTEMPTS: u32 = 5;

/// An ephemeral reverse-proxy endpoint used as the apparent request origin
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Identifier assigned by the provisioning service
    pub identifier: String,

    /// Full base URL requests are resolved against, without trailing slash
    pub host: String,

    /// Egress region the endpoint was provisioned in
    pub egress_region: String,

    /// When the endpoint was provisioned
    pub created_at: DateTime<Utc>,
}

/// Pool of live egress endpoints
///
/// The live set sits behind an async mutex held across the provisioning
/// await in [`EndpointPool::choose`], so an empty pool provisions exactly one
/// replacement endpoint even under concurrent callers.
pub struct EndpointPool {
    provisioner: Arc<dyn Provisioner>,
    selector: Box<dyn Selector>,
    target: String,
    live: Mutex<Vec<Endpoint>>,
}

impl EndpointPool {
    /// Creates an empty pool fronting `target`
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        selector: Box<dyn Selector>,
        target: &str,
    ) -> Self {
        Self {
            provisioner,
            selector,
            target: target.to_string(),
            live: Mutex::new(Vec::new()),
        }
    }

    /// Provisions one endpoint and adds it to the live set
    ///
    /// Provisioning failure propagates; the pool is only usable once startup
    /// provisioning fully succeeds.
    pub async fn new_endpoint(&self) -> Result<Endpoint> {
        let endpoint = self
            .provisioner
            .create_endpoint(&self.target)
            .await
            .map_err(|e| CrawlError::Provision(e.to_string()))?;

        let mut live = self.live.lock().await;
        live.push(endpoint.clone());
        tracing::debug!(host = %endpoint.host, live = live.len(), "endpoint added to pool");
        Ok(endpoint)
    }

    /// Returns a randomly chosen live endpoint
    ///
    /// An empty pool self-heals: exactly one endpoint is provisioned on
    /// demand and returned.
    pub async fn choose(&self) -> Result<Endpoint> {
        let mut live = self.live.lock().await;
        if live.is_empty() {
            tracing::warn!("endpoint pool exhausted, provisioning replacement");
            let endpoint = self
                .provisioner
                .create_endpoint(&self.target)
                .await
                .map_err(|e| CrawlError::Provision(e.to_string()))?;
            live.push(endpoint.clone());
            return Ok(endpoint);
        }
        let index = self.selector.pick(live.len());
        Ok(live[index].clone())
    }

    /// Tears down and evicts the endpoint with the given host
    ///
    /// Idempotent: removing an unknown or already-removed host is a no-op.
    pub async fn remove_endpoint(&self, host: &str) {
        let removed = {
            let mut live = self.live.lock().await;
            match live.iter().position(|e| e.host == host) {
                Some(index) => Some(live.swap_remove(index)),
                None => None,
            }
        };

        if let Some(endpoint) = removed {
            tracing::info!(host = %endpoint.host, "evicting endpoint");
            self.teardown_with_retry(&endpoint).await;
        }
    }

    /// Tears down every live endpoint (shutdown and interrupt path)
    pub async fn remove_all(&self) {
        let drained: Vec<Endpoint> = {
            let mut live = self.live.lock().await;
            live.drain(..).collect()
        };

        tracing::info!(count = drained.len(), "tearing down endpoint pool");
        for endpoint in &drained {
            self.teardown_with_retry(endpoint).await;
        }
    }

    /// Number of endpoints currently live
    pub async fn len(&self) -> usize {
        self.live.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.live.lock().await.is_empty()
    }

    /// Retried best-effort teardown: backoff 1, 2, 4, 8, 16 seconds, then
    /// give up with a log line rather than blocking shutdown
    async fn teardown_with_retry(&self, endpoint: &Endpoint) {
        for attempt in 0..TEARDOWN_ATTEMPTS {
            match self.provisioner.destroy_endpoint(endpoint).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        host = %endpoint.host,
                        attempt = attempt + 1,
                        error = %e,
                        "endpoint teardown failed"
                    );
                    // No backoff after the last attempt; shutdown should not
                    // stall once the endpoint is being abandoned anyway.
                    if attempt + 1 < TEARDOWN_ATTEMPTS {
                        tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                    }
                }
            }
        }
        tracing::error!(
            host = %endpoint.host,
            "abandoning endpoint after {TEARDOWN_ATTEMPTS} teardown attempts"
        );
    }
}
