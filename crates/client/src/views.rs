//! Search, paging and project grouping over normalized entries.

use serde::Serialize;

use manualhub_core::CatalogEntry;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Entries whose document number contains `query`, ignoring case.
/// A blank query matches everything.
pub fn search_by_document_no<'a>(entries: &'a [CatalogEntry], query: &str) -> Vec<&'a CatalogEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| needle.is_empty() || e.document_no.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice `items` into pages of `page_size` and return page `page` (1-based).
///
/// An empty input still has one (empty) page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total_items);

    Page {
        items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
        page,
        total_pages,
        total_items,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectGroup {
    pub project_no: String,
    pub documents: Vec<CatalogEntry>,
    pub variant_count: usize,
}

/// Entries with a project number, grouped by it in first-seen order.
pub fn group_by_project(entries: &[CatalogEntry]) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for entry in entries {
        let Some(project) = entry.project() else {
            continue;
        };
        let idx = match groups.iter().position(|g| g.project_no == project) {
            Some(idx) => idx,
            None => {
                groups.push(ProjectGroup {
                    project_no: project.to_string(),
                    documents: Vec::new(),
                    variant_count: 0,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.variant_count += entry.language_variants.len();
        group.documents.push(entry.clone());
    }
    groups
}

/// Distinct project numbers in use, sorted.
pub fn known_project_numbers(entries: &[CatalogEntry]) -> Vec<String> {
    let mut numbers: Vec<String> = entries
        .iter()
        .filter_map(|e| e.project().map(str::to_string))
        .collect();
    numbers.sort();
    numbers.dedup();
    numbers
}
