//! The shopping basket as a value.
//!
//! A [`Cart`] is an immutable snapshot: every change goes through
//! [`Cart::apply`] and produces a new cart. The constructors in this module
//! and in [`sanitize`] are the only ways to obtain one, so every `Cart` in
//! circulation satisfies the same invariants:
//!
//! - at most one [`CartLine`] per [`ProductId`]
//! - every line's quantity is in `1..=MAX_QTY`
//! - the persisted form always carries `"version": 1`
//!
//! # Persisted layout
//!
//! ```json
//! {
//!   "version": 1,
//!   "updatedAt": "2026-01-01T00:00:00Z",
//!   "lines": [
//!     {
//!       "productId": "tea-1",
//!       "name": "Miško Uogos",
//!       "priceLabel": "£12.00",
//!       "imageUrl": "https://x/y.jpg",
//!       "imageAlt": "Miško Uogos",
//!       "quantity": 1
//!     }
//!   ]
//! }
//! ```

mod mutation;
mod sanitize;
mod totals;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::types::ProductId;

pub use mutation::{CartMutation, clamp_quantity};
pub use sanitize::sanitize;
pub use totals::{CartTotals, badge_text, basket_label};

/// Largest quantity a single line may hold.
pub const MAX_QTY: u32 = 99;

/// The only persisted format version this build reads or writes.
pub const SCHEMA_VERSION: u64 = 1;

/// Storage key the cart lives under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "arbatai_cart_v1";

/// Product display data supplied by the catalog when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price_label: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
}

impl ProductSummary {
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price_label: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_label: price_label.into(),
            image_url: image_url.into(),
            image_alt: None,
        }
    }

    #[must_use]
    pub fn with_image_alt(mut self, image_alt: impl Into<String>) -> Self {
        self.image_alt = Some(image_alt.into());
        self
    }

    /// Alt text for the product image, falling back to the product name.
    #[must_use]
    pub fn display_alt(&self) -> &str {
        alt_or_name(self.image_alt.as_deref(), &self.name)
    }
}

/// One product's presence in the cart.
///
/// Display fields are a copy of the product data from the most recent add;
/// the cart never refreshes them on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    product_id: ProductId,
    name: String,
    price_label: String,
    image_url: String,
    image_alt: String,
    quantity: u32,
}

impl CartLine {
    /// Build a line from catalog data. `quantity` must already be clamped.
    fn from_product(product: &ProductSummary, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price_label: product.price_label.clone(),
            image_url: product.image_url.clone(),
            image_alt: product.display_alt().to_owned(),
            quantity,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn price_label(&self) -> &str {
        &self.price_label
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    #[must_use]
    pub fn image_alt(&self) -> &str {
        &self.image_alt
    }

    /// Always in `1..=MAX_QTY`.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// The shopping basket.
///
/// Deserializing never fails on well-formed JSON: the decoded document goes
/// through [`sanitize`], so a foreign or damaged payload becomes an empty
/// cart (or loses only the damaged lines) instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct Cart {
    updated_at: DateTime<Utc>,
    lines: Vec<CartLine>,
}

impl Cart {
    /// The canonical empty cart, stamped with the Unix epoch.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            lines: Vec::new(),
        }
    }

    /// Time of the last mutation. Informational only.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn unique_line_count(&self) -> usize {
        self.lines.len()
    }

    /// Estimated item count and subtotal for display.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::estimate(self)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<serde_json::Value> for Cart {
    fn from(value: serde_json::Value) -> Self {
        sanitize(&value)
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Persisted<'a> {
            version: u64,
            updated_at: &'a DateTime<Utc>,
            lines: &'a [CartLine],
        }

        Persisted {
            version: SCHEMA_VERSION,
            updated_at: &self.updated_at,
            lines: &self.lines,
        }
        .serialize(serializer)
    }
}

fn alt_or_name<'a>(alt: Option<&'a str>, name: &'a str) -> &'a str {
    match alt {
        Some(alt) if !alt.trim().is_empty() => alt,
        _ => name,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tea() -> ProductSummary {
        ProductSummary::new("tea-1", "Miško Uogos", "£12.00", "https://x/y.jpg")
    }

    #[test]
    fn test_empty_cart_is_stamped_with_epoch() {
        let cart = Cart::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.updated_at(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(cart.total_quantity(), 0);
        assert_eq!(cart.unique_line_count(), 0);
    }

    #[test]
    fn test_display_alt_falls_back_to_name() {
        assert_eq!(tea().display_alt(), "Miško Uogos");
        assert_eq!(tea().with_image_alt("   ").display_alt(), "Miško Uogos");
        assert_eq!(tea().with_image_alt("Jar of tea").display_alt(), "Jar of tea");
    }

    #[test]
    fn test_serialized_layout() {
        let cart = Cart::empty()
            .apply(
                &CartMutation::add(tea(), 2),
                "2026-03-01T10:00:00Z".parse().unwrap(),
            )
            .unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            json!({
                "version": 1,
                "updatedAt": "2026-03-01T10:00:00Z",
                "lines": [{
                    "productId": "tea-1",
                    "name": "Miško Uogos",
                    "priceLabel": "£12.00",
                    "imageUrl": "https://x/y.jpg",
                    "imageAlt": "Miško Uogos",
                    "quantity": 2
                }]
            })
        );
    }

    #[test]
    fn test_deserialize_goes_through_sanitizer() {
        let cart: Cart = serde_json::from_str(r#"{"version":2,"lines":[]}"#).unwrap();
        assert_eq!(cart, Cart::empty());

        let raw = serde_json::to_string(
            &Cart::empty()
                .apply(&CartMutation::add(tea(), 3), Utc::now())
                .unwrap(),
        )
        .unwrap();
        let cart: Cart = serde_json::from_str(&raw).unwrap();
        assert_eq!(cart.line("tea-1").unwrap().quantity(), 3);
    }

    #[test]
    fn test_total_quantity_sums_lines() {
        let now = Utc::now();
        let cart = Cart::empty()
            .apply(&CartMutation::add(tea(), 4), now)
            .unwrap()
            .apply(
                &CartMutation::add(ProductSummary::new("honey", "Honey", "£5", "h.jpg"), 2),
                now,
            )
            .unwrap();
        assert_eq!(cart.total_quantity(), 6);
        assert_eq!(cart.unique_line_count(), 2);
    }
}
