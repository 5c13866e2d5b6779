//! Storage traits and error types

use crate::storage::{CorporateRecord, Region};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are insert-if-absent: a primary-key collision is a benign no-op,
/// never an error. That is the sole concurrency-correctness mechanism the
/// crawl relies on, so re-running any phase is idempotent.
pub trait Storage {
    /// Inserts a region unless one with the same id already exists
    ///
    /// Returns true if a row was inserted.
    fn insert_region_if_absent(&mut self, region: &Region) -> StorageResult<bool>;

    /// Lists all regions at the given level of the hierarchy
    fn regions_at_level(&self, level: u32) -> StorageResult<Vec<Region>>;

    /// Total number of stored regions
    fn region_count(&self) -> StorageResult<u64>;

    /// Inserts a corporate record unless its tax id is already known
    ///
    /// Returns true if a row was inserted.
    fn insert_corporate_if_absent(&mut self, record: &CorporateRecord) -> StorageResult<bool>;

    /// Whether a corporate record with this tax id is already stored
    fn has_corporate(&self, tax_id: &str) -> StorageResult<bool>;

    /// Total number of stored corporate records
    fn corporate_count(&self) -> StorageResult<u64>;
}
