/// Offset pagination with whitelisted sorting
///
/// Pages are zero-based: `page=0` is the first page. Sort fields arrive
/// as camelCase request keys and are resolved against a per-entity
/// whitelist to real column names, so no request value is ever spliced
/// into SQL unchecked. An unknown sort field is a client error, never a
/// silent fallback to the default order.

use serde::Serialize;
use std::str::FromStr;

use super::QueryError;

/// Default page size when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on page size; larger requests are clamped.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(QueryError::InvalidDirection(other.to_string())),
        }
    }
}

/// Pagination and sorting parameters for a list query.
///
/// `sort_by` and `direction` are kept as raw request strings; they are
/// validated in [`PageParams::order_by`] against the calling entity's
/// whitelist so the error can name the offending value.
#[derive(Debug, Clone, Default)]
pub struct PageParams {
    /// Zero-based page index
    pub page: Option<i64>,

    /// Page size (defaults to [`DEFAULT_PAGE_SIZE`])
    pub size: Option<i64>,

    /// Requested sort field (camelCase request key)
    pub sort_by: Option<String>,

    /// Requested direction (`asc` or `desc`)
    pub direction: Option<String>,
}

impl PageParams {
    /// Effective page index; negative values collapse to 0.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).max(0)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn size(&self) -> i64 {
        self.size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Row offset for the effective page.
    pub fn offset(&self) -> i64 {
        self.page() * self.size()
    }

    /// Resolves the sort request to an `ORDER BY` fragment.
    ///
    /// `whitelist` maps request keys to column names; `default_field`
    /// and `default_direction` apply when the request omits them. An
    /// unknown field or direction is rejected with a [`QueryError`].
    pub fn order_by(
        &self,
        whitelist: &[(&str, &str)],
        default_field: &str,
        default_direction: SortDirection,
    ) -> Result<String, QueryError> {
        let column = match self.sort_by.as_deref() {
            None => default_field,
            Some(requested) => whitelist
                .iter()
                .find(|(key, _)| *key == requested)
                .map(|(_, column)| *column)
                .ok_or_else(|| QueryError::UnknownSortField(requested.to_string()))?,
        };

        let direction = match self.direction.as_deref() {
            None => default_direction,
            Some(raw) => raw.parse()?,
        };

        Ok(format!("{} {}", column, direction.as_sql()))
    }
}

/// One page of results plus the metadata clients need to iterate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,

    /// Zero-based index of this page
    pub page: i64,

    /// Requested page size (the last page may hold fewer rows)
    pub size: i64,

    /// Total matching rows across all pages
    pub total_elements: i64,

    /// Total number of pages for this size
    pub total_pages: i64,

    /// Whether this is the final page
    pub last: bool,
}

impl<T> Page<T> {
    /// Assembles a page from its slice of rows and the total count.
    pub fn new(content: Vec<T>, page: i64, size: i64, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            last: (page + 1) * size >= total_elements,
        }
    }

    /// Maps the row type while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            last: self.last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITELIST: &[(&str, &str)] = &[
        ("createdAt", "created_at"),
        ("name", "name"),
        ("dueDate", "due_date"),
    ];

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 0);
        assert_eq!(params.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
        assert_eq!(
            params
                .order_by(WHITELIST, "created_at", SortDirection::Desc)
                .unwrap(),
            "created_at DESC"
        );
    }

    #[test]
    fn test_offset_and_clamping() {
        let params = PageParams {
            page: Some(3),
            size: Some(25),
            ..Default::default()
        };
        assert_eq!(params.offset(), 75);

        let oversized = PageParams {
            size: Some(100_000),
            ..Default::default()
        };
        assert_eq!(oversized.size(), MAX_PAGE_SIZE);

        let negative = PageParams {
            page: Some(-1),
            size: Some(0),
            ..Default::default()
        };
        assert_eq!(negative.page(), 0);
        assert_eq!(negative.size(), 1);
    }

    #[test]
    fn test_sort_field_resolution() {
        let params = PageParams {
            sort_by: Some("dueDate".to_string()),
            direction: Some("ASC".to_string()),
            ..Default::default()
        };
        assert_eq!(
            params
                .order_by(WHITELIST, "created_at", SortDirection::Desc)
                .unwrap(),
            "due_date ASC"
        );
    }

    #[test]
    fn test_unknown_sort_field_is_rejected() {
        let params = PageParams {
            sort_by: Some("passwordHash".to_string()),
            ..Default::default()
        };
        let err = params
            .order_by(WHITELIST, "created_at", SortDirection::Desc)
            .unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField(f) if f == "passwordHash"));
    }

    #[test]
    fn test_invalid_direction_is_rejected() {
        let params = PageParams {
            sort_by: Some("name".to_string()),
            direction: Some("sideways".to_string()),
            ..Default::default()
        };
        let err = params
            .order_by(WHITELIST, "created_at", SortDirection::Desc)
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidDirection(_)));
    }

    #[test]
    fn test_page_metadata() {
        let page: Page<i32> = Page::new(vec![1, 2, 3], 0, 3, 7);
        assert_eq!(page.total_pages, 3);
        assert!(!page.last);

        let last: Page<i32> = Page::new(vec![7], 2, 3, 7);
        assert!(last.last);

        // An exactly-full final page is still the last page
        let exact: Page<i32> = Page::new(vec![4, 5, 6], 1, 3, 6);
        assert!(exact.last);

        let empty: Page<i32> = Page::new(vec![], 0, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.last);
    }

    #[test]
    fn test_page_sizes_sum_to_total() {
        // Walking every page with the stored metadata visits each row once
        let total = 23_i64;
        let size = 10_i64;
        let mut seen = 0;
        let mut page_index = 0;
        loop {
            let rows_on_page = (total - page_index * size).clamp(0, size);
            let page: Page<i64> = Page::new(vec![0; rows_on_page as usize], page_index, size, total);
            seen += page.content.len() as i64;
            if page.last {
                break;
            }
            page_index += 1;
        }
        assert_eq!(seen, total);
    }

    #[test]
    fn test_page_map_preserves_metadata() {
        let page = Page::new(vec![1, 2], 1, 2, 5).map(|n: i32| n.to_string());
        assert_eq!(page.content, vec!["1", "2"]);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_elements, 5);
    }
}
