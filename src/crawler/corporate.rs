//! Record phase: paginated corporate listings under each level-3 region
//!
//! Per leaf region the listing is paginated with a running-maximum page
//! count, detail links are unioned across pages, and detail fetches fan out
//! concurrently over the union. Each detail is independent and failure
//! tolerant; the batch for one region is persisted in a single session with
//! tax-id deduplication.

use crate::client::RetryingClient;
use crate::crawler::extract::{extract_corporate, extract_search_page, tax_id_from_path};
use crate::storage::{CorporateRecord, Region, SqliteStorage, Storage};
use crate::Result;
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

pub struct CorporateCrawler {
    client: Arc<RetryingClient>,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl CorporateCrawler {
    pub fn new(client: Arc<RetryingClient>, storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { client, storage }
    }

    /// Crawls the corporate listings of every level-3 region
    pub async fn crawl(&self) -> Result<()> {
        let leaves = {
            let storage = self.storage.lock().unwrap();
            storage.regions_at_level(3)?
        };
        tracing::info!(regions = leaves.len(), "starting corporate phase");

        let tasks = leaves.iter().map(|region| async move {
            if let Err(e) = self.crawl_region(region).await {
                tracing::error!(region = %region, error = %e, "corporate crawl failed for region");
            }
        });
        join_all(tasks).await;
        Ok(())
    }

    /// Searches one region's listing and stores its corporate records
    async fn crawl_region(&self, region: &Region) -> Result<()> {
        let links = self.search_region(region).await;
        if links.is_empty() {
            tracing::warn!(region = %region, "no corporate links found");
            return Ok(());
        }

        // Skip links whose tax id is already stored; re-crawls discard known
        // records rather than updating them.
        let fresh: Vec<(String, String)> = {
            let storage = self.storage.lock().unwrap();
            let mut fresh = Vec::new();
            for link in &links {
                let Some(tax_id) = tax_id_from_path(link) else {
                    tracing::warn!(link = %link, "detail link carries no tax id, skipping");
                    continue;
                };
                if !storage.has_corporate(&tax_id)? {
                    fresh.push((link.clone(), tax_id));
                }
            }
            fresh
        };

        let fetched = join_all(
            fresh
                .iter()
                .map(|(link, tax_id)| self.fetch_detail(link, tax_id, &region.id)),
        )
        .await;
        let records: Vec<CorporateRecord> = fetched.into_iter().flatten().collect();

        // One batch, one session, per region.
        let inserted = {
            let mut storage = self.storage.lock().unwrap();
            let mut inserted = 0;
            for record in &records {
                if storage.insert_corporate_if_absent(record)? {
                    inserted += 1;
                }
            }
            inserted
        };

        tracing::info!(
            region = %region,
            links = links.len(),
            fetched = records.len(),
            inserted,
            "stored corporate batch"
        );
        Ok(())
    }

    /// Paginates a region's search listing, unioning detail links
    ///
    /// `max_page` is a running maximum over everything seen so far; a page
    /// with no pagination markup reports 0 and leaves the maximum at 1. If
    /// page 1 itself fails the loop ends having collected nothing; the client
    /// already spent its full retry budget on that page.
    async fn search_region(&self, region: &Region) -> BTreeSet<String> {
        let mut links = BTreeSet::new();
        let mut current_page: u32 = 1;
        let mut max_page: u32 = 1;

        while current_page <= max_page {
            let page_param = current_page.to_string();
            let query = [("page", page_param.as_str())];
            match self.client.get(&region.url, Some(&query)).await {
                Ok(outcome) if outcome.is_success() => {
                    match outcome.into_response().text().await {
                        Ok(body) => {
                            let page = extract_search_page(&body);
                            max_page = max_page.max(page.max_page);
                            links.extend(page.links);
                        }
                        Err(e) => {
                            tracing::warn!(region = %region, current_page, error = %e, "failed to read search page body");
                        }
                    }
                }
                Ok(outcome) => {
                    tracing::warn!(
                        region = %region,
                        current_page,
                        status = outcome.status().as_u16(),
                        "search page fetch exhausted retries"
                    );
                }
                Err(e) => {
                    tracing::warn!(region = %region, current_page, error = %e, "search page fetch errored");
                }
            }
            current_page += 1;
        }

        links
    }

    /// Fetches one detail page and extracts a best-effort record
    ///
    /// Total fetch failure yields no record for this link; a parse that finds
    /// no usable fields still yields a record with the fields absent.
    async fn fetch_detail(
        &self,
        link: &str,
        fallback_tax_id: &str,
        region_id: &str,
    ) -> Option<CorporateRecord> {
        let outcome = match self.client.get(link, None).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(link, error = %e, "detail fetch errored");
                return None;
            }
        };
        let Some(resp) = outcome.ok() else {
            tracing::warn!(link, "detail fetch exhausted retries");
            return None;
        };
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(link, error = %e, "failed to read detail body");
                return None;
            }
        };
        Some(extract_corporate(&body, fallback_tax_id, region_id))
    }
}
