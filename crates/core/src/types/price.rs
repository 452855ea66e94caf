//! Best-effort price handling for free-form price labels.
//!
//! The catalog stores prices as display labels (`"£12.00"`, `"€8,50"`,
//! `"from $4"`), not as structured amounts. This module recovers an amount
//! and a currency from such labels well enough to show an estimated
//! subtotal. Anything it cannot read yields `None`; callers fall back to an
//! "estimate unavailable" display instead of failing.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// First signed decimal number in a label, after thousands separators are removed.
static AMOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("amount pattern is valid"));

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pounds, not pence).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display (e.g., "£1,234.50").
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self.amount.round_dp(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let mut magnitude = rounded.abs();
        magnitude.rescale(2);
        let digits = magnitude.to_string();
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
        format!(
            "{sign}{}{}.{fraction}",
            self.currency_code.symbol(),
            group_thousands(whole)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes the storefront labels use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GBP,
    EUR,
    USD,
}

impl CurrencyCode {
    /// Guess the currency of a price label from its symbol.
    ///
    /// Labels without a recognised symbol are assumed to be in pounds.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label.contains('£') {
            Self::GBP
        } else if label.contains('€') {
            Self::EUR
        } else if label.contains('$') {
            Self::USD
        } else {
            Self::GBP
        }
    }

    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::GBP => "£",
            Self::EUR => "€",
            Self::USD => "$",
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GBP => "GBP",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }
}

/// Extract the amount from a free-form price label.
///
/// Commas are treated as thousands separators and stripped, then the first
/// signed decimal number is taken. Returns `None` when the label holds no
/// number at all.
#[must_use]
pub fn parse_price_label(label: &str) -> Option<Decimal> {
    let cleaned = label.replace(',', "");
    let found = AMOUNT_PATTERN.find(&cleaned)?;
    found.as_str().parse::<Decimal>().ok()
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_currency_from_label() {
        assert_eq!(CurrencyCode::from_label("£12.00"), CurrencyCode::GBP);
        assert_eq!(CurrencyCode::from_label("€8.50"), CurrencyCode::EUR);
        assert_eq!(CurrencyCode::from_label("$4"), CurrencyCode::USD);
        assert_eq!(CurrencyCode::from_label("12.00"), CurrencyCode::GBP);
    }

    #[test]
    fn test_parse_price_label() {
        assert_eq!(parse_price_label("£12.00"), Some(dec("12.00")));
        assert_eq!(parse_price_label("from $4 each"), Some(dec("4")));
        assert_eq!(parse_price_label("£1,250.5"), Some(dec("1250.5")));
        assert_eq!(parse_price_label("-3.20 EUR"), Some(dec("-3.20")));
    }

    #[test]
    fn test_parse_price_label_without_number() {
        assert_eq!(parse_price_label("Price on request"), None);
        assert_eq!(parse_price_label(""), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::new(dec("12"), CurrencyCode::GBP).display(), "£12.00");
        assert_eq!(
            Price::new(dec("1234.5"), CurrencyCode::EUR).display(),
            "€1,234.50"
        );
        assert_eq!(
            Price::new(dec("1000000"), CurrencyCode::USD).display(),
            "$1,000,000.00"
        );
        assert_eq!(Price::new(dec("-5.1"), CurrencyCode::GBP).display(), "-£5.10");
        assert_eq!(Price::zero(CurrencyCode::GBP).to_string(), "£0.00");
    }
}
