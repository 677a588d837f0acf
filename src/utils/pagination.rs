//! Page bookkeeping and compact page windows for pager controls.

use serde::Serialize;
use thiserror::Error;

/// Number of neighbouring pages shown on each side of the current page
pub const DEFAULT_PAGE_RADIUS: u32 = 2;

/// Errors raised when page bookkeeping would break its invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Total pages must be at least 1")]
    NoPages,

    #[error("Page {current} is outside 1..={total}")]
    OutOfRange { current: u32, total: u32 },
}

/// Current position within a paginated result set
///
/// Invariant: `1 <= current <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    current: u32,
    total: u32,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            current: 1,
            total: 1,
        }
    }
}

impl PageInfo {
    /// Build page info, rejecting values that break the invariant
    pub fn new(current: u32, total: u32) -> Result<Self, PageError> {
        if total == 0 {
            return Err(PageError::NoPages);
        }
        if current == 0 || current > total {
            return Err(PageError::OutOfRange { current, total });
        }
        Ok(Self { current, total })
    }

    /// Normalise a server response
    ///
    /// An empty corpus reports zero pages, which is treated as a single empty
    /// page. The echoed page is clamped into range.
    pub fn from_response(page: u32, total_pages: u32) -> Self {
        let total = total_pages.max(1);
        Self {
            current: page.clamp(1, total),
            total,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Whether the "previous" control is enabled
    pub fn has_previous(&self) -> bool {
        self.current > 1
    }

    /// Whether the "next" control is enabled
    pub fn has_next(&self) -> bool {
        self.current < self.total
    }

    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.current + 1)
    }

    /// Whether navigating to `target` is a real transition
    pub fn can_go_to(&self, target: u32) -> bool {
        (1..=self.total).contains(&target) && target != self.current
    }

    /// Page window around the current page
    pub fn window(&self, radius: u32) -> Vec<PageToken> {
        compute_page_window(self.current, self.total, radius)
    }
}

/// One entry of a pager control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageToken::Page(n) => write!(f, "{}", n),
            PageToken::Ellipsis => f.write_str("..."),
        }
    }
}

/// Compact page sequence for a pager
///
/// Always contains the first and last page and every page within `radius` of
/// `current`. A single ellipsis replaces each run of omitted pages.
///
/// ```
/// use scholar_lens::utils::{compute_page_window, PageToken::{Ellipsis, Page}};
///
/// assert_eq!(
///     compute_page_window(5, 10, 2),
///     vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Ellipsis, Page(10)]
/// );
/// ```
pub fn compute_page_window(current: u32, total: u32, radius: u32) -> Vec<PageToken> {
    if total == 0 {
        return Vec::new();
    }

    let current = current.clamp(1, total);
    let low = current.saturating_sub(radius).max(1);
    let high = current.saturating_add(radius).min(total);

    let mut included: Vec<u32> = Vec::with_capacity((high - low + 3) as usize);
    included.push(1);
    included.extend(low..=high);
    included.push(total);
    included.dedup();

    let mut window = Vec::with_capacity(included.len() + 2);
    let mut previous: Option<u32> = None;
    for page in included {
        if matches!(previous, Some(prev) if page - prev > 1) {
            window.push(PageToken::Ellipsis);
        }
        window.push(PageToken::Page(page));
        previous = Some(page);
    }
    window
}

/// Everything a pager control needs to draw itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub window: Vec<PageToken>,
    pub current: u32,
    pub total: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl Pager {
    pub fn new(info: PageInfo, radius: u32) -> Self {
        Self {
            window: info.window(radius),
            current: info.current(),
            total: info.total(),
            previous_enabled: info.has_previous(),
            next_enabled: info.has_next(),
        }
    }

    /// A pager is only worth drawing for more than one page
    pub fn is_visible(&self) -> bool {
        self.total > 1
    }
}
