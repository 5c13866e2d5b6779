//! Egress-endpoint provisioning
//!
//! Endpoints are reverse-proxy resources created through an external
//! provisioning service. Creation and teardown both go over the network and
//! can be slow or fail transiently, so they sit behind the [`Provisioner`]
//! trait; tests substitute an in-process implementation.

use crate::pool::Endpoint;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

/// Egress regions an endpoint may be provisioned in
pub const ALL_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "eu-central-1",
    "ca-central-1",
    "ap-south-1",
    "ap-northeast-3",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "sa-east-1",
];

/// Errors from the provisioning service
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("provisioning request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provisioning service returned status {0}")]
    Status(u16),

    #[error("malformed provisioning response: {0}")]
    Response(String),
}

/// Remote capability that creates and destroys egress endpoints
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provisions a new endpoint fronting `target`
    async fn create_endpoint(&self, target: &str) -> Result<Endpoint, ProvisionError>;

    /// Tears down an endpoint; may fail transiently
    async fn destroy_endpoint(&self, endpoint: &Endpoint) -> Result<(), ProvisionError>;
}

/// Wire shape of the provisioning service's create response
#[derive(Debug, Deserialize)]
struct CreateEndpointResponse {
    id: String,
    host: String,
}

/// Provisioner backed by an HTTP provisioning service
///
/// `POST {base}/endpoints` creates an endpoint fronting the target URI in a
/// randomly chosen egress region; `DELETE {base}/endpoints/{id}` tears it
/// down.
pub struct HttpProvisioner {
    base_url: String,
    client: reqwest::Client,
}

impl HttpProvisioner {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Provisioner for HttpProvisioner {
    async fn create_endpoint(&self, target: &str) -> Result<Endpoint, ProvisionError> {
        use rand::seq::SliceRandom;
        let region = ALL_REGIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("us-east-1");

        let resp = self
            .client
            .post(format!("{}/endpoints", self.base_url))
            .json(&json!({ "target": target, "region": region }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProvisionError::Status(resp.status().as_u16()));
        }

        let body: CreateEndpointResponse = resp
            .json()
            .await
            .map_err(|e| ProvisionError::Response(e.to_string()))?;

        tracing::info!(id = %body.id, host = %body.host, region, "provisioned endpoint");

        Ok(Endpoint {
            identifier: body.id,
            host: body.host,
            egress_region: region.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn destroy_endpoint(&self, endpoint: &Endpoint) -> Result<(), ProvisionError> {
        let resp = self
            .client
            .delete(format!(
                "{}/endpoints/{}",
                self.base_url, endpoint.identifier
            ))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ProvisionError::Status(resp.status().as_u16()));
        }

        tracing::info!(id = %endpoint.identifier, "destroyed endpoint");
        Ok(())
    }
}

/// Strategy for picking an endpoint out of the live set
///
/// Injectable so retry and eviction tests can make the choice deterministic.
pub trait Selector: Send + Sync {
    /// Returns an index in `0..len`; `len` is always >= 1
    fn pick(&self, len: usize) -> usize;
}

/// Uniformly random selection (production default)
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn pick(&self, len: usize) -> usize {
        use rand::Rng;
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the first endpoint (deterministic, for tests)
pub struct FirstSelector;

impl Selector for FirstSelector {
    fn pick(&self, _len: usize) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_selector_stays_in_bounds() {
        let selector = RandomSelector;
        for len in 1..20 {
            for _ in 0..50 {
                assert!(selector.pick(len) < len);
            }
        }
    }

    #[test]
    fn first_selector_is_deterministic() {
        let selector = FirstSelector;
        assert_eq!(selector.pick(1), 0);
        assert_eq!(selector.pick(10), 0);
    }
}
