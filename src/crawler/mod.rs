//! Crawl orchestration
//!
//! This module wires the pipeline together: rate limiter, endpoint pool,
//! retrying client, and the two crawl phases (region tree, then corporate
//! listings). Everything hangs off a [`CrawlContext`] constructed once at
//! startup and shut down explicitly, both on completion and on interrupt.

mod corporate;
pub mod extract;
mod region;

pub use corporate::CorporateCrawler;
pub use region::RegionCrawler;

use crate::client::RetryingClient;
use crate::config::Config;
use crate::limiter::RateLimiter;
use crate::pool::{EndpointPool, HttpProvisioner, Provisioner, RandomSelector, Selector};
use crate::storage::SqliteStorage;
use crate::Result;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Process-scoped crawl context
///
/// Owns the shared pipeline components and hands them to both phases. The
/// explicit [`CrawlContext::shutdown`] tears down every live endpoint; it is
/// called on normal completion and by the interrupt handler, so remote
/// resources are never leaked.
pub struct CrawlContext {
    storage: Arc<Mutex<SqliteStorage>>,
    pool: Arc<EndpointPool>,
    client: Arc<RetryingClient>,
}

impl CrawlContext {
    /// Builds the context and provisions the startup endpoint pool
    ///
    /// Any provisioning failure here is fatal: a partial pool indicates a
    /// systemic outage of the provisioning service.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let provisioner: Arc<dyn Provisioner> =
            Arc::new(HttpProvisioner::new(&config.provisioner.base_url));
        Self::initialize_with(config, provisioner, Box::new(RandomSelector)).await
    }

    /// Like [`CrawlContext::initialize`] but with injected provisioning and
    /// endpoint selection, for tests
    pub async fn initialize_with(
        config: &Config,
        provisioner: Arc<dyn Provisioner>,
        selector: Box<dyn Selector>,
    ) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let storage = Arc::new(Mutex::new(storage));

        let target = format!("{}://{}", config.target.scheme, config.target.domain);
        let pool = Arc::new(EndpointPool::new(provisioner, selector, &target));
        for _ in 0..config.crawler.pool_size {
            if let Err(e) = pool.new_endpoint().await {
                // A partial pool is fatal, but the endpoints already created
                // are live remote resources and must not outlive the failure.
                pool.remove_all().await;
                return Err(e);
            }
        }
        tracing::info!(
            endpoints = config.crawler.pool_size,
            target = %target,
            "endpoint pool provisioned"
        );

        let limiter = Arc::new(RateLimiter::new(config.crawler.rate_limit));
        let client = Arc::new(RetryingClient::new(
            limiter,
            Arc::clone(&pool),
            config.crawler.max_retries,
        )?);

        Ok(Self {
            storage,
            pool,
            client,
        })
    }

    /// Runs the region phase, then the record phase
    pub async fn run(&self) -> Result<()> {
        RegionCrawler::new(Arc::clone(&self.client), Arc::clone(&self.storage))
            .crawl()
            .await?;
        CorporateCrawler::new(Arc::clone(&self.client), Arc::clone(&self.storage))
            .crawl()
            .await?;
        Ok(())
    }

    /// Best-effort teardown of every live endpoint
    pub async fn shutdown(&self) {
        self.pool.remove_all().await;
    }

    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    pub fn pool(&self) -> Arc<EndpointPool> {
        Arc::clone(&self.pool)
    }
}

/// Runs a complete crawl: initialize, both phases, shutdown
pub async fn run_crawl(config: &Config) -> Result<()> {
    let context = CrawlContext::initialize(config).await?;
    let outcome = context.run().await;
    context.shutdown().await;
    outcome
}
