//! # List Screen Behaviour
//!
//! Search, pagination and multi-select as used by every CRUD list
//! (products, categories, suppliers, warehouses, inventory) and the POS
//! product grid.
//!
//! ```text
//! all items ──► filter_by_search(term) ──► paginate(page, per_page) ──► Page<T>
//!                                                         │
//!                         Selection (checkbox ids) ◄──────┘
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Search
// =============================================================================

/// Something a list screen can search through.
pub trait Searchable {
    /// The text fields a search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match over [`Searchable::search_fields`].
    ///
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Keeps the items whose fields contain `term`, ignoring case.
///
/// A blank term keeps everything.
pub fn filter_by_search<T: Searchable>(items: Vec<T>, term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| item.matches(&needle)).collect()
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number that was requested.
    pub page: usize,
    pub per_page: usize,
    /// Number of items across all pages.
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Transforms the items while keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Clamps a requested page size into `1..=MAX_PAGE_SIZE`, using
/// [`DEFAULT_PAGE_SIZE`] when none was asked for.
pub fn page_size(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Slices `items` into 1-based pages of `per_page`.
///
/// A page past the end yields no items but still reports the real
/// `total_pages`. Page 0 is treated as page 1.
///
/// ## Example
/// ```rust
/// use nanotrade_core::listing::paginate;
///
/// let page = paginate((1..=17).collect::<Vec<_>>(), 3, 8);
/// assert_eq!(page.items, vec![17]);
/// assert_eq!(page.total_pages, 3);
/// ```
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page);
    let items = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(per_page).collect()
    };

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Ids ticked in a list, in the order they were ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Selection::default()
    }

    /// Adds the id if absent, removes it if present. Returns whether the id
    /// is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.ids.retain(|s| s != id);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    /// Deselects an id (no-op if it was not selected).
    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|s| s != id);
    }

    /// Drops selected ids that no longer exist in the list.
    pub fn retain_existing<'a, I>(&mut self, existing: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: HashSet<&str> = existing.into_iter().collect();
        self.ids.retain(|id| existing.contains(id.as_str()));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
