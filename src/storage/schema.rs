//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the corpinfo database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Administrative regions, a forest of fixed depth 3
CREATE TABLE IF NOT EXISTS regions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    level INTEGER NOT NULL,
    level_name TEXT NOT NULL,
    url TEXT NOT NULL,
    parent_id TEXT,
    parent_name TEXT
);

CREATE INDEX IF NOT EXISTS idx_regions_level ON regions(level);
CREATE INDEX IF NOT EXISTS idx_regions_parent ON regions(parent_id);

-- Corporate records discovered under level-3 regions
CREATE TABLE IF NOT EXISTS corporates (
    tax_id TEXT PRIMARY KEY,
    name TEXT,
    international_name TEXT,
    short_name TEXT,
    rep_person TEXT,
    company_type TEXT,
    industry TEXT,
    address TEXT,
    phone TEXT,
    active_date TEXT,
    status TEXT,
    last_update TEXT,
    region_id TEXT NOT NULL REFERENCES regions(id)
);

CREATE INDEX IF NOT EXISTS idx_corporates_region ON corporates(region_id);
"#;

/// Initializes the database schema
///
/// Safe to call on every open; all statements are `IF NOT EXISTS`.
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
