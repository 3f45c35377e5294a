//! Page windowing over an ordered id sequence.

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

/// A validated `(page, per_page)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Result<Self> {
        if page < 1 || page > i64::from(u32::MAX) {
            return Err(AppError::Validation(format!(
                "page must be >= 1, got {}",
                page
            )));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, per_page
            )));
        }

        Ok(Self {
            page: page as u32,
            per_page: per_page as u32,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Slice `ordered` to this page's window
    pub fn window<'a, T>(&self, ordered: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset())
            .unwrap_or(usize::MAX)
            .min(ordered.len());
        let end = start.saturating_add(self.per_page as usize).min(ordered.len());
        &ordered[start..end]
    }
}

/// `ceil(total / per_page)`, and 1 for an empty result
pub fn total_pages(total: u64, per_page: u32) -> u64 {
    if total == 0 || per_page == 0 {
        return 1;
    }
    total.div_ceil(u64::from(per_page))
}

/// Put fetched rows back into `ids` order, skipping ids that were not fetched.
pub fn reorder_by_ids<T, F>(ids: &[Uuid], rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
{
    let mut by_id: HashMap<Uuid, T> = rows.into_iter().map(|row| (key(&row), row)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}
