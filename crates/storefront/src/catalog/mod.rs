//! Product catalog paging and per-browser catalog views.
//!
//! Every rendered catalog page gets its own [`CatalogView`], so two tabs of
//! the same browser never supersede each other's fetches. Views live in a
//! [`CatalogViews`] registry keyed by the session's owner id plus the page's
//! view id. Views that have not been touched for [`VIEW_IDLE_TTL`] are
//! evicted.

mod view;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use view::{CatalogView, Completion, FetchTicket, ViewState};

/// Largest page the storefront will ask the backend for.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// How long an untouched catalog view is kept.
pub const VIEW_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Invalid paging parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("page number must be at least 1")]
    PageNumber,
    #[error("page size must be between 1 and {MAX_PAGE_SIZE}")]
    PageSize,
}

/// Paging parameters for `GET Product`.
///
/// Serialized with the backend's query parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilters {
    #[serde(rename = "PageNumber")]
    pub page_number: u32,
    #[serde(rename = "PageSize")]
    pub page_size: u32,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductFilters {
    /// Build filters, rejecting out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if `page_number` is 0 or `page_size` is outside
    /// `1..=MAX_PAGE_SIZE`.
    pub const fn new(page_number: u32, page_size: u32) -> Result<Self, FilterError> {
        if page_number == 0 {
            return Err(FilterError::PageNumber);
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(FilterError::PageSize);
        }
        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Build filters from untrusted input, pulling values into range.
    #[must_use]
    pub fn clamped(page_number: Option<u32>, page_size: Option<u32>, default_size: u32) -> Self {
        Self {
            page_number: page_number.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(default_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The previous page, if there is one.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        (self.page_number > 1).then(|| Self {
            page_number: self.page_number - 1,
            page_size: self.page_size,
        })
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
            page_size: self.page_size,
        }
    }
}

// =============================================================================
// View Registry
// =============================================================================

/// Identifies one catalog page instance.
///
/// `owner` is stored in the browser session; `page` is minted when the page
/// shell renders and echoed back by its fragment requests. A view can only
/// be reached from the session that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewKey {
    pub owner: Uuid,
    pub page: Uuid,
}

impl ViewKey {
    /// Key for `page`, or the owner's shared view when no page id was sent.
    #[must_use]
    pub fn new(owner: Uuid, page: Option<Uuid>) -> Self {
        Self {
            owner,
            page: page.unwrap_or_default(),
        }
    }
}

/// Shared handle to one page's catalog view.
///
/// The mutex is only ever held for synchronous state transitions, never
/// across an `.await`.
pub type SharedView = Arc<Mutex<CatalogView>>;

/// Registry of catalog views, one per rendered catalog page.
#[derive(Clone)]
pub struct CatalogViews {
    views: Cache<ViewKey, SharedView>,
}

impl Default for CatalogViews {
    fn default() -> Self {
        Self::new(VIEW_IDLE_TTL)
    }
}

impl CatalogViews {
    #[must_use]
    pub fn new(idle_ttl: Duration) -> Self {
        let views = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(idle_ttl)
            .build();
        Self { views }
    }

    /// The view for `key`, creating an empty one if needed.
    pub async fn get_or_create(&self, key: ViewKey) -> SharedView {
        self.views
            .get_with(key, async { Arc::new(Mutex::new(CatalogView::new())) })
            .await
    }

    /// The view for `key`, if it exists.
    pub async fn get(&self, key: ViewKey) -> Option<SharedView> {
        self.views.get(&key).await
    }
}
