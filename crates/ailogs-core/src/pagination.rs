//! Page slicing for ordered result sets
//!
//! Pages are 1-indexed. Asking for a page past the end yields an empty page
//! rather than an error.
//!
//! # Examples
//!
//! ```
//! use ailogs_core::pagination::paginate;
//!
//! let items: Vec<u32> = (1..=120).collect();
//! let page = paginate(&items, 50, 3);
//! assert_eq!(page.items.len(), 20);
//! assert_eq!(page.total_pages, 3);
//! assert!(!page.has_next);
//! assert!(page.has_prev);
//! ```

use crate::error::{AilogsError, Result};
use serde::{Deserialize, Serialize};

/// Default number of rows per page in the log viewer
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// One page of an ordered list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    /// Requested page number (1-indexed)
    pub page: usize,
    pub page_size: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Transform the items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            page: self.page,
            page_size: self.page_size,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Slice `items` into the requested page.
///
/// A zero `page_size` yields zero pages; use [`try_paginate`] to reject it.
pub fn paginate<T: Clone>(items: &[T], page_size: usize, page: usize) -> Page<T> {
    let total_items = items.len();
    let total_pages = if page_size == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    };

    let slice: &[T] = if page == 0 || page > total_pages {
        &[]
    } else {
        let start = (page - 1) * page_size;
        let end = (start + page_size).min(total_items);
        &items[start..end]
    };

    Page {
        items: slice.to_vec(),
        total_items,
        total_pages,
        page,
        page_size,
        has_next: page < total_pages,
        has_prev: page > 1 && total_pages > 0,
    }
}

/// Like [`paginate`], but rejects a zero page size or page number
pub fn try_paginate<T: Clone>(items: &[T], page_size: usize, page: usize) -> Result<Page<T>> {
    if page_size == 0 {
        return Err(AilogsError::validation("pageSize", "must be at least 1"));
    }
    if page == 0 {
        return Err(AilogsError::validation("page", "pages are numbered from 1"));
    }
    Ok(paginate(items, page_size, page))
}
