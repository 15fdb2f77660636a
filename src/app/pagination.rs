//! Pagination slicer.
//!
//! Slices a derived view into a bounded page. Page numbers are 1-based and the
//! requested page is clamped into `1..=total_pages`; the clamp is reported back
//! so the view state can store the corrected page.

use crate::domain::{AptdeskError, Result};

/// Page size used when none is configured or a zero size is corrected.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];

/// One page of a derived view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, at most `page_size` of them.
    pub items: Vec<T>,
    /// `max(1, ceil(len / page_size))`.
    pub total_pages: usize,
    /// The page actually shown after clamping.
    pub clamped_page: usize,
    /// Zero-based offset of the first item within the view.
    pub offset: usize,
    /// Length of the whole view.
    pub total_items: usize,
}

impl<T> Page<T> {
    /// One-based `(first, last)` item numbers shown, `None` on an empty view.
    #[must_use]
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            None
        } else {
            Some((self.offset + 1, self.offset + self.items.len()))
        }
    }
}

/// Rejects a zero page size.
///
/// # Errors
///
/// Returns [`AptdeskError::Validation`] when `page_size` is zero.
pub fn validate_page_size(page_size: usize) -> Result<usize> {
    if page_size == 0 {
        Err(AptdeskError::Validation(
            "page size must be at least 1".to_string(),
        ))
    } else {
        Ok(page_size)
    }
}

/// Number of pages for a view of `len` items.
#[must_use]
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Slices `view` into the requested page.
///
/// A zero `page_size` is treated as [`DEFAULT_PAGE_SIZE`]; callers that want the
/// validation error should run [`validate_page_size`] first.
///
/// # Examples
///
/// ```
/// use aptdesk::app::pagination::paginate;
///
/// let view: Vec<u32> = (1..=25).collect();
/// let page = paginate(&view, 10, 10);
/// assert_eq!(page.clamped_page, 3);
/// assert_eq!(page.total_pages, 3);
/// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
/// ```
#[must_use]
pub fn paginate<T: Clone>(view: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    };
    let total_pages = total_pages(view.len(), page_size);
    let clamped_page = page.clamp(1, total_pages);
    let offset = (clamped_page - 1) * page_size;
    let end = (offset + page_size).min(view.len());
    let items = view.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items,
        total_pages,
        clamped_page,
        offset,
        total_items: view.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_view_has_one_empty_page() {
        let page = paginate::<u8>(&[], 4, 10);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.clamped_page, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.item_range(), None);
    }

    #[test]
    fn page_zero_clamps_to_first() {
        let view = [1, 2, 3];
        let page = paginate(&view, 0, 2);
        assert_eq!(page.clamped_page, 1);
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn last_page_may_be_short() {
        let view: Vec<u32> = (1..=57).collect();
        let page = paginate(&view, 3, 20);
        assert_eq!(page.items.len(), 17);
        assert_eq!(page.item_range(), Some((41, 57)));
    }

    #[test]
    fn zero_page_size_is_invalid() {
        assert!(validate_page_size(0).unwrap_err().is_validation());
        assert_eq!(validate_page_size(20).unwrap(), 20);
        assert_eq!(paginate(&[1, 2, 3], 1, 0).items.len(), 3);
    }
}
