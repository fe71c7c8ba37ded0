//! Page/limit parsing and offset calculation

use crate::models::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

/// Requested page of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: i64,
    /// Maximum rows on the page
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build from raw query string values
    ///
    /// Missing, unparsable or non-positive values fall back to the defaults
    /// independently of each other.
    ///
    /// # Examples
    /// ```
    /// use muslib_songs::pagination::PageRequest;
    ///
    /// let p = PageRequest::from_query(Some("2"), Some("abc"));
    /// assert_eq!(p.page, 2);
    /// assert_eq!(p.limit, 3);
    /// assert_eq!(p.offset(), 3);
    /// ```
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// Offset for SQL LIMIT/OFFSET query
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_positive(value: Option<&str>) -> Option<i64> {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}
