//! Paging, ordering and the concurrent count + list fetch

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, DetailCode};
use crate::handlers::response::PaginationMeta;
use crate::repository::{OrderDirection, PageRequest, Sort};
use crate::validation::FieldErrors;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Paging and ordering query parameters shared by every listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub order_by: Option<String>,
    pub order_type: Option<String>,
}

impl ListParams {
    /// Apply defaults and check the values against `sortable`
    ///
    /// `id` is always sortable. Sizes above [`MAX_PAGE_SIZE`] are capped.
    pub fn resolve(&self, sortable: &[&str]) -> Result<(PageRequest, Sort), AppError> {
        let mut errors = FieldErrors::new();

        let page = self.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            errors.add("page", DetailCode::ValueTooLow);
        }

        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size < 1 {
            errors.add("size", DetailCode::ValueTooLow);
        }

        let column = self.order_by.as_deref().unwrap_or("id");
        if column != "id" && !sortable.contains(&column) {
            errors.add("order_by", DetailCode::InvalidChoice);
        }

        let direction = match self.order_type.as_deref() {
            None => OrderDirection::Ascending,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                errors.add("order_type", DetailCode::InvalidChoice);
                OrderDirection::Ascending
            }),
        };

        errors.finish()?;
        Ok((
            PageRequest::new(page, size.min(MAX_PAGE_SIZE)),
            Sort::new(column, direction),
        ))
    }
}

/// One page of results with its pagination block
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationMeta>,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total: i64) -> Self {
        Self {
            items,
            pagination: PaginationMeta::new(Some(page.page), Some(page.size), Some(total)),
        }
    }
}

/// Await the count and the page together
///
/// The first error wins and the other future is dropped unfinished.
pub async fn fetch_page<C, L, T, E>(count: C, list: L) -> Result<(i64, Vec<T>), E>
where
    C: Future<Output = Result<i64, E>>,
    L: Future<Output = Result<Vec<T>, E>>,
{
    tokio::try_join!(count, list)
}
