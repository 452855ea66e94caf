//! Derived, display-only aggregates.

use rust_decimal::Decimal;

use super::Cart;
use crate::types::{CurrencyCode, Price, parse_price_label};

/// Placeholder shown when a subtotal cannot be estimated.
const UNAVAILABLE: &str = "—";

/// Item count and best-effort subtotal of a cart.
///
/// Price labels are free text, so the subtotal is an estimate: it is only
/// computed when every line's label yields a number, and it is reported in
/// the currency of the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Option<Price>,
}

impl CartTotals {
    #[must_use]
    pub fn estimate(cart: &Cart) -> Self {
        Self {
            item_count: cart.total_quantity(),
            subtotal: estimate_subtotal(cart),
        }
    }

    /// Whether every line's price could be read.
    #[must_use]
    pub const fn can_compute(&self) -> bool {
        self.subtotal.is_some()
    }

    #[must_use]
    pub fn subtotal_label(&self) -> String {
        self.subtotal
            .map_or_else(|| UNAVAILABLE.to_string(), |p| p.display())
    }

    #[must_use]
    pub const fn subtotal_heading(&self) -> &'static str {
        if self.can_compute() {
            "Subtotal"
        } else {
            "Subtotal (est.)"
        }
    }
}

fn estimate_subtotal(cart: &Cart) -> Option<Price> {
    let Some(first) = cart.lines().first() else {
        return Some(Price::zero(CurrencyCode::GBP));
    };
    let currency = CurrencyCode::from_label(first.price_label());

    let mut subtotal = Decimal::ZERO;
    for line in cart.lines() {
        let unit = parse_price_label(line.price_label())?;
        subtotal = subtotal.checked_add(unit.checked_mul(Decimal::from(line.quantity()))?)?;
    }
    Some(Price::new(subtotal, currency))
}

/// Accessible label for the basket link.
#[must_use]
pub fn basket_label(total_quantity: u32) -> String {
    match total_quantity {
        0 => "Basket".to_string(),
        1 => "Basket (1 item)".to_string(),
        n => format!("Basket ({n} items)"),
    }
}

/// Text for the count badge; hidden when the basket is empty.
#[must_use]
pub fn badge_text(total_quantity: u32) -> Option<String> {
    match total_quantity {
        0 => None,
        n if n > 99 => Some("99+".to_string()),
        n => Some(n.to_string()),
    }
}
