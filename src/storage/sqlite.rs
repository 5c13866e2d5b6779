//! SQLite storage implementation

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{CorporateRecord, Region};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> Result<Self, crate::CrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, crate::CrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn region_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Region> {
    Ok(Region {
        id: row.get(0)?,
        name: row.get(1)?,
        level: row.get(2)?,
        level_name: row.get(3)?,
        url: row.get(4)?,
        parent_id: row.get(5)?,
        parent_name: row.get(6)?,
    })
}

impl Storage for SqliteStorage {
    fn insert_region_if_absent(&mut self, region: &Region) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO regions
             (id, name, level, level_name, url, parent_id, parent_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                region.id,
                region.name,
                region.level,
                region.level_name,
                region.url,
                region.parent_id,
                region.parent_name,
            ],
        )?;
        Ok(changed > 0)
    }

    fn regions_at_level(&self, level: u32) -> StorageResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, level, level_name, url, parent_id, parent_name
             FROM regions WHERE level = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![level], region_from_row)?;
        let mut regions = Vec::new();
        for row in rows {
            regions.push(row?);
        }
        Ok(regions)
    }

    fn region_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM regions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn insert_corporate_if_absent(&mut self, record: &CorporateRecord) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO corporates
             (tax_id, name, international_name, short_name, rep_person, company_type,
              industry, address, phone, active_date, status, last_update, region_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                record.tax_id,
                record.name,
                record.international_name,
                record.short_name,
                record.rep_person,
                record.company_type,
                record.industry,
                record.address,
                record.phone,
                record.active_date,
                record.status,
                record.last_update,
                record.region_id,
            ],
        )?;
        Ok(changed > 0)
    }

    fn has_corporate(&self, tax_id: &str) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM corporates WHERE tax_id = ?1",
            params![tax_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn corporate_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM corporates", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::level_name;

    fn region(id: &str, level: u32, parent: Option<(&str, &str)>) -> Region {
        Region {
            id: id.to_string(),
            name: format!("Region {id}"),
            level,
            level_name: level_name(level).to_string(),
            url: format!("/region-{id}"),
            parent_id: parent.map(|(pid, _)| pid.to_string()),
            parent_name: parent.map(|(_, pname)| pname.to_string()),
        }
    }

    fn corporate(tax_id: &str, region_id: &str) -> CorporateRecord {
        CorporateRecord {
            tax_id: tax_id.to_string(),
            name: Some(format!("Company {tax_id}")),
            region_id: region_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn region_insert_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let r = region("79", 1, None);

        assert!(storage.insert_region_if_absent(&r).unwrap());
        assert!(!storage.insert_region_if_absent(&r).unwrap());
        assert_eq!(storage.region_count().unwrap(), 1);
    }

    #[test]
    fn regions_filtered_by_level() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_region_if_absent(&region("79", 1, None)).unwrap();
        storage
            .insert_region_if_absent(&region("760", 2, Some(("79", "Region 79"))))
            .unwrap();
        storage
            .insert_region_if_absent(&region("761", 2, Some(("79", "Region 79"))))
            .unwrap();

        assert_eq!(storage.regions_at_level(1).unwrap().len(), 1);
        let level2 = storage.regions_at_level(2).unwrap();
        assert_eq!(level2.len(), 2);
        assert_eq!(level2[0].parent_id.as_deref(), Some("79"));
        assert!(storage.regions_at_level(3).unwrap().is_empty());
    }

    #[test]
    fn duplicate_tax_id_is_a_noop() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_region_if_absent(&region("79", 1, None)).unwrap();

        let first = corporate("0312345678", "79");
        let mut second = corporate("0312345678", "79");
        second.name = Some("Different Name".to_string());

        assert!(storage.insert_corporate_if_absent(&first).unwrap());
        assert!(!storage.insert_corporate_if_absent(&second).unwrap());
        assert_eq!(storage.corporate_count().unwrap(), 1);
        assert!(storage.has_corporate("0312345678").unwrap());
        assert!(!storage.has_corporate("9999999999").unwrap());
    }

    #[test]
    fn optional_fields_stay_null() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_region_if_absent(&region("79", 1, None)).unwrap();

        let sparse = CorporateRecord {
            tax_id: "0300000001".to_string(),
            region_id: "79".to_string(),
            ..Default::default()
        };
        storage.insert_corporate_if_absent(&sparse).unwrap();

        let name: Option<String> = storage
            .conn
            .query_row(
                "SELECT name FROM corporates WHERE tax_id = '0300000001'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, None);
    }
}
