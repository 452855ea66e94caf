//! Pure cart state transitions.
//!
//! Each transition takes the current cart by reference and returns a new
//! one stamped with the supplied time. Nothing here touches storage.

use chrono::{DateTime, Utc};

use super::{Cart, CartLine, MAX_QTY, ProductSummary};
use crate::types::ProductId;

/// A requested change to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartMutation {
    /// Add `quantity` of a product, merging with an existing line.
    Add {
        product: ProductSummary,
        quantity: i64,
    },
    /// Drop the line for a product.
    Remove { product_id: ProductId },
    /// Overwrite the quantity of an existing line. Never creates a line.
    SetQuantity { product_id: ProductId, quantity: i64 },
    /// Empty the cart.
    Clear,
}

impl CartMutation {
    #[must_use]
    pub const fn add(product: ProductSummary, quantity: i64) -> Self {
        Self::Add { product, quantity }
    }

    #[must_use]
    pub fn remove(product_id: impl Into<ProductId>) -> Self {
        Self::Remove {
            product_id: product_id.into(),
        }
    }

    #[must_use]
    pub fn set_quantity(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self::SetQuantity {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Clamp a requested quantity into `0..=MAX_QTY`.
#[must_use]
pub fn clamp_quantity(requested: i64) -> u32 {
    let clamped = requested.clamp(0, i64::from(MAX_QTY));
    u32::try_from(clamped).unwrap_or(0)
}

impl Cart {
    /// Apply a mutation, producing the next cart.
    ///
    /// Returns `None` only when the mutation is a no-op that must not be
    /// persisted: an add whose clamped quantity is zero. Removing or
    /// updating an unknown product still yields a freshly stamped cart.
    #[must_use]
    pub fn apply(&self, mutation: &CartMutation, now: DateTime<Utc>) -> Option<Self> {
        match mutation {
            CartMutation::Add { product, quantity } => self.with_added(product, *quantity, now),
            CartMutation::Remove { product_id } => Some(self.without(product_id.as_str(), now)),
            CartMutation::SetQuantity {
                product_id,
                quantity,
            } => Some(self.with_quantity(product_id.as_str(), *quantity, now)),
            CartMutation::Clear => Some(Self::cleared(now)),
        }
    }

    /// Add a product, or bump the quantity of its existing line.
    ///
    /// An existing line takes the incoming display data, since the most
    /// recent add is the freshest copy of the product. Its quantity grows
    /// by the clamped amount and saturates at `MAX_QTY`.
    #[must_use]
    pub fn with_added(
        &self,
        product: &ProductSummary,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let q = clamp_quantity(quantity);
        if q == 0 {
            return None;
        }

        let mut merged = false;
        let mut lines: Vec<CartLine> = self
            .lines
            .iter()
            .map(|line| {
                if line.product_id != product.id {
                    return line.clone();
                }
                merged = true;
                CartLine::from_product(product, (line.quantity + q).min(MAX_QTY))
            })
            .collect();

        if !merged {
            lines.push(CartLine::from_product(product, q.max(1)));
        }

        Some(Self {
            updated_at: now,
            lines,
        })
    }

    /// Drop the line for `product_id`, if any.
    #[must_use]
    pub fn without(&self, product_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            lines: self
                .lines
                .iter()
                .filter(|l| l.product_id != product_id)
                .cloned()
                .collect(),
        }
    }

    /// Set the quantity of an existing line; a clamped quantity of zero removes it.
    #[must_use]
    pub fn with_quantity(&self, product_id: &str, quantity: i64, now: DateTime<Utc>) -> Self {
        let q = clamp_quantity(quantity);
        Self {
            updated_at: now,
            lines: self
                .lines
                .iter()
                .filter_map(|line| {
                    if line.product_id != product_id {
                        return Some(line.clone());
                    }
                    (q > 0).then(|| CartLine {
                        quantity: q.max(1),
                        ..line.clone()
                    })
                })
                .collect(),
        }
    }

    /// An empty cart stamped `now`.
    #[must_use]
    pub const fn cleared(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            lines: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn product(id: &str) -> ProductSummary {
        ProductSummary::new(id, format!("Product {id}"), "£3.50", format!("https://img/{id}.jpg"))
    }

    fn tea() -> ProductSummary {
        ProductSummary::new("tea-1", "Miško Uogos", "£12.00", "https://x/y.jpg")
    }

    fn ids(cart: &Cart) -> Vec<&str> {
        cart.lines().iter().map(|l| l.product_id().as_str()).collect()
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(-5), 0);
        assert_eq!(clamp_quantity(0), 0);
        assert_eq!(clamp_quantity(7), 7);
        assert_eq!(clamp_quantity(150), MAX_QTY);
        assert_eq!(clamp_quantity(i64::MAX), MAX_QTY);
        assert_eq!(clamp_quantity(i64::MIN), 0);
    }

    #[test]
    fn test_add_merges_by_identity() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&tea(), 2, now)
            .unwrap()
            .with_added(&tea(), 3, now)
            .unwrap();

        assert_eq!(cart.unique_line_count(), 1);
        assert_eq!(cart.line("tea-1").unwrap().quantity(), 5);
    }

    #[test]
    fn test_add_caps_merged_quantity() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&tea(), 90, now)
            .unwrap()
            .with_added(&tea(), 90, now)
            .unwrap();
        assert_eq!(cart.line("tea-1").unwrap().quantity(), MAX_QTY);
    }

    #[test]
    fn test_add_non_positive_is_noop() {
        let now = Utc::now();
        assert!(Cart::empty().with_added(&tea(), 0, now).is_none());
        assert!(Cart::empty().with_added(&tea(), -3, now).is_none());
        assert!(
            Cart::empty()
                .apply(&CartMutation::add(tea(), 0), now)
                .is_none()
        );
    }

    #[test]
    fn test_add_refreshes_display_fields() {
        let now = Utc::now();
        let renamed = ProductSummary::new("tea-1", "Forest Berries", "£13.00", "https://x/z.jpg")
            .with_image_alt("A tin of tea");
        let cart = Cart::empty()
            .with_added(&tea(), 1, now)
            .unwrap()
            .with_added(&renamed, 1, now)
            .unwrap();

        let line = cart.line("tea-1").unwrap();
        assert_eq!(line.name(), "Forest Berries");
        assert_eq!(line.price_label(), "£13.00");
        assert_eq!(line.image_url(), "https://x/z.jpg");
        assert_eq!(line.image_alt(), "A tin of tea");
        assert_eq!(line.quantity(), 2);
    }

    #[test]
    fn test_add_appends_new_products_in_order() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&product("a"), 1, now)
            .unwrap()
            .with_added(&product("b"), 1, now)
            .unwrap()
            .with_added(&product("a"), 1, now)
            .unwrap();
        assert_eq!(ids(&cart), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&product("a"), 1, now)
            .unwrap()
            .with_added(&product("b"), 1, now)
            .unwrap()
            .with_added(&product("c"), 1, now)
            .unwrap()
            .without("b", now);
        assert_eq!(ids(&cart), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&product("a"), 1, now)
            .unwrap()
            .with_added(&product("b"), 1, now)
            .unwrap();

        let once = cart.without("a", now);
        let twice = once.without("a", now);
        assert_eq!(once, twice);
        assert_eq!(ids(&twice), vec!["b"]);
    }

    #[test]
    fn test_remove_unknown_still_stamps() {
        let later: DateTime<Utc> = "2026-05-01T00:00:00Z".parse().unwrap();
        let next = Cart::empty()
            .apply(&CartMutation::remove("missing"), later)
            .unwrap();
        assert!(next.is_empty());
        assert_eq!(next.updated_at(), later);
    }

    #[test]
    fn test_set_quantity_scenario() {
        let now = Utc::now();
        let cart = Cart::empty().with_added(&tea(), 1, now).unwrap();
        assert_eq!(cart.line("tea-1").unwrap().quantity(), 1);

        let cart = cart.with_quantity("tea-1", 150, now);
        assert_eq!(cart.line("tea-1").unwrap().quantity(), MAX_QTY);

        let cart = cart.with_quantity("tea-1", 0, now);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_never_creates_line() {
        let now = Utc::now();
        let cart = Cart::empty().with_quantity("tea-1", 5, now);
        assert!(cart.is_empty());

        let cart = Cart::empty()
            .with_added(&product("a"), 1, now)
            .unwrap()
            .with_quantity("tea-1", 5, now);
        assert_eq!(ids(&cart), vec!["a"]);
    }

    #[test]
    fn test_clear() {
        let now = Utc::now();
        let cart = Cart::empty()
            .with_added(&product("a"), 4, now)
            .unwrap()
            .apply(&CartMutation::Clear, now)
            .unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.updated_at(), now);
    }

    proptest! {
        #[test]
        fn set_quantity_stays_in_bounds(start in 1i64..=99, requested in any::<i64>()) {
            let now = Utc::now();
            let cart = Cart::empty()
                .with_added(&tea(), start, now)
                .unwrap()
                .with_quantity("tea-1", requested, now);

            match cart.line("tea-1") {
                Some(line) => {
                    prop_assert!((1..=MAX_QTY).contains(&line.quantity()));
                    prop_assert!(requested > 0);
                }
                None => prop_assert!(requested <= 0),
            }
        }

        #[test]
        fn add_never_exceeds_max(first in any::<i64>(), second in any::<i64>()) {
            let now = Utc::now();
            let cart = Cart::empty();
            let cart = cart.with_added(&tea(), first, now).unwrap_or(cart);
            let cart = cart.with_added(&tea(), second, now).unwrap_or(cart);

            prop_assert!(cart.unique_line_count() <= 1);
            if let Some(line) = cart.line("tea-1") {
                prop_assert!((1..=MAX_QTY).contains(&line.quantity()));
            }
        }
    }
}
