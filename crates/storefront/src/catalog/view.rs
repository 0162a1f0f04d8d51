//! Catalog view state machine.
//!
//! ```text
//!  Idle --begin--> Loading --complete(Ok)--> Loaded
//!                          --complete(Err)-> Failed
//!  Loaded | Failed --begin--> Loading
//! ```
//!
//! Every [`CatalogView::begin`] hands out a [`FetchTicket`] stamped with a new
//! generation. Only the result carrying the latest generation is applied; an
//! older fetch that finishes late is reported as [`Completion::Stale`] and
//! leaves the view alone.

use idwm_core::ProductId;

use super::ProductFilters;
use crate::api::Product;

/// Where the view is in its fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed { message: String },
}

/// Proof that a fetch was started. Passed back to [`CatalogView::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    generation: u64,
    filters: ProductFilters,
}

impl FetchTicket {
    /// The filters this fetch was started with.
    pub const fn filters(&self) -> &ProductFilters {
        &self.filters
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of [`CatalogView::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A newer fetch was started; the result was discarded.
    Stale,
}

/// The catalog as one browser currently sees it.
///
/// The last successfully loaded page is kept through later failures so it
/// can still be shown beneath the error.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    generation: u64,
    filters: ProductFilters,
    state: ViewState,
    products: Vec<Product>,
}

impl CatalogView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for `filters`.
    pub fn begin(&mut self, filters: ProductFilters) -> FetchTicket {
        self.generation = self.generation.wrapping_add(1);
        self.filters = filters.clone();
        self.state = ViewState::Loading;
        FetchTicket {
            generation: self.generation,
            filters,
        }
    }

    /// Apply the result of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Product>, String>,
    ) -> Completion {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale catalog fetch"
            );
            return Completion::Stale;
        }

        match result {
            Ok(products) => {
                self.products = products;
                self.state = ViewState::Loaded;
            }
            Err(message) => {
                self.state = ViewState::Failed { message };
            }
        }
        Completion::Applied
    }

    #[must_use]
    pub const fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub const fn filters(&self) -> &ProductFilters {
        &self.filters
    }

    /// The last successfully loaded page.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product on the current page.
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Loaded successfully with nothing to show.
    #[must_use]
    pub fn is_empty_page(&self) -> bool {
        self.state == ViewState::Loaded && self.products.is_empty()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ViewState::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }
}
