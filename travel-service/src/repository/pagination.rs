//! Pagination and ordering for repository queries
//!
//! # Example
//!
//! ```rust
//! use travel_service::repository::{offset, OrderDirection, PageRequest, Sort};
//!
//! assert_eq!(offset(3, 5), 10);
//!
//! let page = PageRequest::from_parts(Some(2), Some(10)).unwrap();
//! assert_eq!(page.offset(), 10);
//! assert_eq!(page.limit(), 10);
//!
//! let sort = Sort::new("name", OrderDirection::Descending);
//! assert_eq!(sort.direction.as_sql(), "DESC");
//! ```

use std::fmt;
use std::str::FromStr;

/// Rows to skip for a 1-indexed page
///
/// Pages at or below 1 start at the first row.
pub fn offset(page: i64, size: i64) -> i64 {
    if page > 1 {
        (page - 1).saturating_mul(size.max(0))
    } else {
        0
    }
}

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order
    #[default]
    Ascending,
    /// Sort in descending order
    Descending,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown order direction '{}'", other)),
        }
    }
}

/// A requested page, both parts present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: i64,
    /// Rows per page
    pub size: i64,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: i64, size: i64) -> Self {
        Self { page, size }
    }

    /// Pagination applies only when both page and size are given
    pub fn from_parts(page: Option<i64>, size: Option<i64>) -> Option<Self> {
        match (page, size) {
            (Some(page), Some(size)) => Some(Self::new(page, size)),
            _ => None,
        }
    }

    pub fn offset(&self) -> i64 {
        offset(self.page, self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size.max(0)
    }
}

/// Ordering applied before the implicit `id` tie-break
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: OrderDirection,
}

impl Sort {
    pub fn new(column: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, OrderDirection::Ascending)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, OrderDirection::Descending)
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::asc("id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(2, 10), 10);
        assert_eq!(offset(3, 5), 10);
    }

    #[test]
    fn test_offset_for_non_positive_pages() {
        assert_eq!(offset(0, 10), 0);
        assert_eq!(offset(-4, 10), 0);
    }

    #[test]
    fn test_offset_does_not_overflow() {
        assert_eq!(offset(i64::MAX, i64::MAX), i64::MAX);
    }

    #[test]
    fn test_page_request_requires_both_parts() {
        assert!(PageRequest::from_parts(Some(1), None).is_none());
        assert!(PageRequest::from_parts(None, Some(10)).is_none());
        assert_eq!(
            PageRequest::from_parts(Some(4), Some(25)),
            Some(PageRequest::new(4, 25))
        );
    }

    #[test]
    fn test_order_direction_parse() {
        assert_eq!("DESC".parse::<OrderDirection>(), Ok(OrderDirection::Descending));
        assert_eq!("asc".parse::<OrderDirection>(), Ok(OrderDirection::Ascending));
        assert!("sideways".parse::<OrderDirection>().is_err());
    }

    #[test]
    fn test_default_sort_is_id_ascending() {
        let sort = Sort::default();
        assert_eq!(sort.column, "id");
        assert_eq!(sort.direction, OrderDirection::Ascending);
    }
}
