//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler: SQLite
//! initialization and schema management, region persistence, and corporate
//! record persistence with primary-key deduplication.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

/// Human-readable names of the three administrative levels
pub const LEVEL_NAMES: [&str; 3] = ["Tỉnh, thành phố", "Quận, huyện", "Phường, xã"];

/// Returns the display name for a region level (1-based)
pub fn level_name(level: u32) -> &'static str {
    LEVEL_NAMES[(level as usize).clamp(1, 3) - 1]
}

/// One node of the administrative hierarchy
///
/// Forms a forest of fixed depth 3: `parent_id` is None exactly when
/// `level == 1`. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub level_name: String,
    /// Path component on the registry site, not an absolute URL
    pub url: String,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.parent_id, &self.parent_name) {
            (Some(pid), Some(pname)) => {
                write!(f, "{} {} - {} {} {}", pid, pname, self.id, self.level_name, self.name)
            }
            _ => write!(f, "{} {} {}", self.id, self.level_name, self.name),
        }
    }
}

/// One corporate record extracted from a detail page
///
/// Every field except the key pair is optional: extraction may fail to locate
/// a field on the page, in which case it stays unset rather than defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorporateRecord {
    pub tax_id: String,
    pub name: Option<String>,
    pub international_name: Option<String>,
    pub short_name: Option<String>,
    pub rep_person: Option<String>,
    pub company_type: Option<String>,
    pub industry: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub active_date: Option<String>,
    pub status: Option<String>,
    pub last_update: Option<String>,
    pub region_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_are_fixed() {
        assert_eq!(level_name(1), "Tỉnh, thành phố");
        assert_eq!(level_name(2), "Quận, huyện");
        assert_eq!(level_name(3), "Phường, xã");
    }

    #[test]
    fn region_display_includes_parent_when_present() {
        let root = Region {
            id: "79".to_string(),
            name: "Hồ Chí Minh".to_string(),
            level: 1,
            level_name: level_name(1).to_string(),
            url: "/tinh-ho-chi-minh-79".to_string(),
            parent_id: None,
            parent_name: None,
        };
        assert_eq!(format!("{}", root), "79 Tỉnh, thành phố Hồ Chí Minh");

        let child = Region {
            id: "760".to_string(),
            name: "Quận 1".to_string(),
            level: 2,
            level_name: level_name(2).to_string(),
            url: "/quan-1-760".to_string(),
            parent_id: Some("79".to_string()),
            parent_name: Some("Hồ Chí Minh".to_string()),
        };
        let shown = format!("{}", child);
        assert!(shown.starts_with("79 Hồ Chí Minh"));
        assert!(shown.ends_with("760 Quận, huyện Quận 1"));
    }
}
