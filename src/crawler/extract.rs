//! HTML extraction for the registry site
//!
//! Pure functions from raw markup to structured data. None of them ever
//! error on malformed input; missing markup yields empty or partial results
//! and the caller decides what to do with them.

use crate::storage::{level_name, CorporateRecord, Region};
use scraper::{Html, Selector};
use std::collections::BTreeSet;

/// Pagination state and detail links extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// Highest page number visible in the pagination controls; 0 when the
    /// page carries no pagination markup
    pub max_page: u32,

    /// Detail-page paths found in the listing
    pub links: BTreeSet<String>,
}

/// Extracts child regions from a page's sidebar
///
/// Each sidebar entry becomes a region at `level`, stamped with the parent's
/// id and name when one is given. The region id is the trailing segment of
/// the entry's href. Entries missing an href or a label are skipped.
pub fn extract_regions(html: &str, level: u32, parent: Option<&Region>) -> Vec<Region> {
    let document = Html::parse_document(html);
    let (Ok(entry_selector), Ok(link_selector)) = (
        Selector::parse("div#sidebar ul li"),
        Selector::parse("a[href]"),
    ) else {
        return Vec::new();
    };

    let mut regions = Vec::new();
    for entry in document.select(&entry_selector) {
        let Some(anchor) = entry.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let name = anchor.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(id) = region_id_from_path(href) else {
            continue;
        };

        regions.push(Region {
            id,
            name,
            level,
            level_name: level_name(level).to_string(),
            url: href.to_string(),
            parent_id: parent.map(|p| p.id.clone()),
            parent_name: parent.map(|p| p.name.clone()),
        });
    }
    regions
}

/// Extracts the pagination maximum and detail links from a listing page
pub fn extract_search_page(html: &str) -> SearchPage {
    let document = Html::parse_document(html);

    let mut max_page = 0;
    if let Ok(page_selector) = Selector::parse("ul.page-numbers a.page-numbers") {
        for element in document.select(&page_selector) {
            let text = element.text().collect::<String>();
            // Non-numeric entries ("Next", ellipses) count as 0.
            let page_no: u32 = text.trim().parse().unwrap_or(0);
            max_page = max_page.max(page_no);
        }
    }

    let mut links = BTreeSet::new();
    if let Ok(link_selector) = Selector::parse("div.tax-listing div[data-prefetch] h3 a[href]") {
        for element in document.select(&link_selector) {
            if let Some(href) = element.value().attr("href") {
                links.insert(href.to_string());
            }
        }
    }

    SearchPage { max_page, links }
}

/// Extracts a corporate record from a detail page, best effort
///
/// Fields the page does not carry stay unset. The tax id comes from the
/// page's own field when present, otherwise from `fallback_tax_id` (derived
/// from the link slug); an empty result there leaves the record unusable and
/// the caller filters it out.
pub fn extract_corporate(html: &str, fallback_tax_id: &str, region_id: &str) -> CorporateRecord {
    let document = Html::parse_document(html);

    let mut record = CorporateRecord {
        tax_id: fallback_tax_id.to_string(),
        region_id: region_id.to_string(),
        ..Default::default()
    };

    let (Ok(row_selector), Ok(cell_selector)) =
        (Selector::parse("table.table-taxinfo tr"), Selector::parse("td"))
    else {
        return record;
    };

    for row in document.select(&row_selector) {
        let mut cells = row.select(&cell_selector);
        let (Some(label_cell), Some(value_cell)) = (cells.next(), cells.next()) else {
            continue;
        };
        let label = label_cell.text().collect::<String>().trim().to_string();
        let value = value_cell.text().collect::<String>().trim().to_string();
        if value.is_empty() {
            continue;
        }

        match label.as_str() {
            "Mã số thuế" => record.tax_id = value,
            "Tên chính thức" => record.name = Some(value),
            "Tên quốc tế" => record.international_name = Some(value),
            "Tên viết tắt" => record.short_name = Some(value),
            "Người đại diện" => record.rep_person = Some(value),
            "Loại hình DN" => record.company_type = Some(value),
            "Ngành nghề chính" => record.industry = Some(value),
            "Địa chỉ" => record.address = Some(value),
            "Điện thoại" => record.phone = Some(value),
            "Ngày hoạt động" => record.active_date = Some(value),
            "Tình trạng" => record.status = Some(value),
            "Cập nhật" => record.last_update = Some(value),
            _ => {}
        }
    }

    record
}

/// Derives a region id from a sidebar path: the trailing `-`-separated segment
pub fn region_id_from_path(path: &str) -> Option<String> {
    let id = path.rsplit('-').next()?.trim_matches('/');
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Derives a tax id from a detail link slug: the leading path segment up to
/// the first `-`
pub fn tax_id_from_path(path: &str) -> Option<String> {
    let segment = path.trim_start_matches('/').split('/').next()?;
    let id = segment.split('-').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}
