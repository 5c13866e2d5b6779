//! Region phase: walks the three-level administrative hierarchy
//!
//! Level 1 comes from the root page's sidebar. Levels 2 and 3 fan out one
//! fetch per already-stored parent region, concurrently, bounded only by the
//! rate limiter. Every discovered batch is persisted insert-if-absent, so
//! re-running the phase is a no-op.

use crate::client::RetryingClient;
use crate::crawler::extract::extract_regions;
use crate::storage::{SqliteStorage, Storage};
use crate::Result;
use futures::future::join_all;
use std::sync::{Arc, Mutex};

pub struct RegionCrawler {
    client: Arc<RetryingClient>,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl RegionCrawler {
    pub fn new(client: Arc<RetryingClient>, storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { client, storage }
    }

    /// Crawls all three levels in order
    pub async fn crawl(&self) -> Result<()> {
        self.crawl_first_level().await?;
        self.crawl_level(2).await?;
        self.crawl_level(3).await?;
        Ok(())
    }

    /// Fetches the root page once and stores its sidebar as level-1 regions
    async fn crawl_first_level(&self) -> Result<()> {
        let stored = self.crawl_region_page("/", 1, None).await?;
        tracing::info!(stored, "got all regions at level 1");
        Ok(())
    }

    /// Fans out one fetch per level-(N-1) parent and stores level-N children
    async fn crawl_level(&self, level: u32) -> Result<()> {
        let parents = {
            let storage = self.storage.lock().unwrap();
            storage.regions_at_level(level - 1)?
        };
        tracing::info!(level, parents = parents.len(), "starting region level");

        let tasks = parents.iter().map(|parent| async move {
            match self
                .crawl_region_page(&parent.url, level, Some(parent))
                .await
            {
                Ok(stored) => {
                    tracing::info!(parent = %parent, stored, "got all sub-regions");
                }
                Err(e) => {
                    // One unreachable parent contributes zero children, the
                    // siblings keep going.
                    tracing::error!(parent = %parent, error = %e, "region fetch failed");
                }
            }
        });
        join_all(tasks).await;
        Ok(())
    }

    /// Fetches one page, extracts its sidebar regions, persists the batch
    ///
    /// Returns the number of newly stored regions. A non-success response or
    /// unparseable markup yields zero, logged, never an error.
    async fn crawl_region_page(
        &self,
        path: &str,
        level: u32,
        parent: Option<&crate::storage::Region>,
    ) -> Result<usize> {
        let outcome = self.client.get(path, None).await?;
        let Some(resp) = outcome.ok() else {
            tracing::error!(path, "failed to fetch region page");
            return Ok(0);
        };
        let body = resp.text().await?;

        let regions = extract_regions(&body, level, parent);
        if regions.is_empty() {
            tracing::warn!(path, level, "no regions extracted from page");
            return Ok(0);
        }

        // One exclusive session writes the whole batch before committing.
        let stored = {
            let mut storage = self.storage.lock().unwrap();
            let mut stored = 0;
            for region in &regions {
                if storage.insert_region_if_absent(region)? {
                    stored += 1;
                }
            }
            stored
        };

        tracing::info!(
            path,
            level,
            extracted = regions.len(),
            stored,
            "stored region batch"
        );
        Ok(stored)
    }
}
