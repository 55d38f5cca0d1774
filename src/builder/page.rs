//! Pagination result.

use serde::Serialize;

use crate::error::AppError;

/// `SKIP`/`LIMIT` for page `page` (1-based; `0` is treated as `1`).
///
/// Fails when `per_page` is zero or the offset does not fit a Cypher integer.
pub(crate) fn page_window(per_page: u64, page: u64) -> Result<(u64, u64), AppError> {
    if per_page == 0 {
        return Err(AppError::InvalidArgument(
            "per_page must be at least 1".to_string(),
        ));
    }
    let skip = (page.max(1) - 1)
        .checked_mul(per_page)
        .filter(|skip| skip.checked_add(per_page).is_some())
        .ok_or_else(|| {
            AppError::InvalidArgument(format!(
                "page {} of {} items is out of range",
                page, per_page
            ))
        })?;
    check_bound("skip", skip)?;
    check_bound("per_page", per_page)?;
    Ok((skip, per_page))
}

/// Rejects `SKIP`/`LIMIT` values above `i64::MAX`.
pub(crate) fn check_bound(name: &str, value: u64) -> Result<u64, AppError> {
    if value > i64::MAX as u64 {
        return Err(AppError::InvalidArgument(format!(
            "{} {} exceeds {}",
            name,
            value,
            i64::MAX
        )));
    }
    Ok(value)
}

/// One page of results with the totals needed to render pagination controls.
///
/// `from` and `to` are 1-based positions of the first and last item on this
/// page; both are `None` when the page is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Page<T> {
    /// Assembles a page from the items fetched with `SKIP (page-1)*per_page`.
    ///
    /// `per_page` must be non-zero; callers validate it.
    pub(crate) fn new(data: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        let skip = current_page.saturating_sub(1).saturating_mul(per_page);
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            (
                Some(skip.saturating_add(1)),
                Some(skip.saturating_add(per_page).min(total)),
            )
        };

        Self {
            data,
            total,
            per_page,
            current_page,
            last_page,
            from,
            to,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_of_five() {
        let page = Page::new(vec!['a', 'b'], 5, 2, 1);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.from, Some(1));
        assert_eq!(page.to, Some(2));
        assert!(page.has_more_pages());
    }

    #[test]
    fn test_last_page_clamps_to_total() {
        let page = Page::new(vec!['e'], 5, 2, 3);
        assert_eq!(page.from, Some(5));
        assert_eq!(page.to, Some(5));
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_window_skips_previous_pages() {
        assert_eq!(page_window(2, 1).unwrap(), (0, 2));
        assert_eq!(page_window(2, 0).unwrap(), (0, 2));
        assert_eq!(page_window(15, 3).unwrap(), (30, 15));
    }

    #[test]
    fn test_window_rejects_out_of_range() {
        for (per_page, page) in [(0, 1), (2, u64::MAX), (u64::MAX, 1), (1, u64::MAX)] {
            assert!(matches!(
                page_window(per_page, page),
                Err(AppError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_empty_result_set() {
        let page: Page<char> = Page::new(vec![], 0, 10, 1);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);
        assert!(page.is_empty());
    }
}
