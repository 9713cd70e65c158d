//! Response envelopes shared by the server handlers and the API client.
//!
//! Every list endpoint answers `{"data": [...], "pagination": {...}}` and every
//! single-resource endpoint answers `{"data": ...}`. Older backends sent the
//! page block as `meta` with camelCase keys; deserialization accepts both.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    #[serde(alias = "perPage", alias = "limit")]
    pub per_page: i64,
    #[serde(alias = "totalItems", alias = "total_items")]
    pub total: i64,
    #[serde(alias = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    #[serde(alias = "meta")]
    pub pagination: Pagination,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: Pagination::new(page.page, page.per_page, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Clamped page window derived from `page` / `per_page` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

/// Turn an optional search term into an ILIKE pattern, ignoring blank input.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.replace('%', "\\%").replace('_', "\\_")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn page_request_is_clamped() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req.page, 1);
        assert_eq!(req.per_page, MAX_PER_PAGE);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(3), None);
        assert_eq!(req.per_page, DEFAULT_PER_PAGE);
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn meta_block_with_camel_case_is_normalized() {
        let body = json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"page": 2, "perPage": 2, "total": 7, "totalPages": 4}
        });
        let page: Paginated<serde_json::Value> = serde_json::from_value(body).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.pagination.total_pages, 4);
        assert_eq!(page.pagination.per_page, 2);
    }

    #[test]
    fn serializes_snake_case_pagination_key() {
        let page = Paginated::new(vec![1, 2, 3], PageRequest::new(Some(1), Some(2)), 3);
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["pagination"]["total_pages"], 2);
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(Some("  ")), None);
        assert_eq!(search_pattern(Some("50%")).as_deref(), Some("%50\\%%"));
        assert_eq!(search_pattern(Some("ana")).as_deref(), Some("%ana%"));
    }
}
