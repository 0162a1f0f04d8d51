//! Session-held shopping cart.

use idwm_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::Product;

/// Why a product could not be added.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart total is too large")]
    TotalTooLarge,
}

/// One product in the cart, with the name and price captured when added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price * quantity`, or `None` when it does not fit a price.
    #[must_use]
    pub fn line_total(&self) -> Option<Price> {
        self.unit_price.checked_times(self.quantity)
    }
}

/// The cart of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Add one unit of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalTooLarge`] and leaves the cart unchanged when
    /// the new subtotal would not fit a price.
    pub fn add(&mut self, product: &Product) -> Result<(), CartError> {
        let mut next = self.clone();
        match next
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => next.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: 1,
            }),
        }

        if next.subtotal().is_none() {
            return Err(CartError::TotalTooLarge);
        }
        *self = next;
        Ok(())
    }

    /// Sum of all line quantities. Shown in the navigation badge.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of the line totals, or `None` when it does not fit a price.
    #[must_use]
    pub fn subtotal(&self) -> Option<Price> {
        let totals = self
            .lines
            .iter()
            .map(CartLine::line_total)
            .collect::<Option<Vec<_>>>()?;
        Price::checked_sum(totals)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
